pub mod macros;

mod addr;
mod args;
mod binding;
mod class;
mod dependencies;
mod error;
mod evaluation;
mod function;
mod instance;
mod manager;
mod owner;
mod render;
mod tag;
mod value;
mod var;
mod version;

use std::rc::{Rc, Weak};

pub use args::{ArgSources, Args, ArgsDiff, Named, Positional};
pub use binding::Binding;
pub use class::{ClassDefinition, ClassManager, ClassModifier, ClassState};
pub use dependencies::Dependencies;
pub use error::{BoxError, Error, Hook, Result};
pub use evaluation::Evaluation;
pub use function::{FunctionManager, FunctionModifier, FunctionState, ModifierFn, Teardown};
pub use instance::{Context, Instance, Lifecycle};
pub use manager::ModifierManager;
pub use owner::{Owner, Registry, Service};
pub use render::{flush, in_render, pending, render, Reactive};
pub use tag::Tag;
pub use value::{Const, Ref, Value};
pub use var::{Toggle, Var};
pub use version::{Hashed, Version};

pub trait Derived: 'static {
	fn invalidate(self: Rc<Self>, invalid: Invalid);
}

pub trait Observable: 'static {
	/// The version of the value as it is right now.
	fn version(&self) -> Version;

	/// Notify this observable that `derived` started
	/// to listen.
	fn used_by(&self, derived: Weak<dyn Derived>);

	/// Notify this observable that `derived` stopped
	/// to listen.
	fn not_used_by(&self, derived: &Weak<dyn Derived>);
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum State {
	Valid,
	Invalid(Invalid),
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Invalid {
	/// Something we read was written. Versions decide whether
	/// it actually differs from what we saw.
	Maybe,
	/// Never ran, or the last run failed.
	Definitely,
}
