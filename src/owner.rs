use std::any::Any;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::error::{Error, Result};
use crate::Var;

/// Resolves auxiliary services by name. Handed to modifiers from
/// construction onward.
pub trait Owner: 'static {
	fn lookup(&self, name: &str) -> Option<Rc<dyn Any>>;
}

impl dyn Owner {
	pub fn service<S: Service>(&self, name: &str) -> Result<S> {
		let any = self
			.lookup(name)
			.ok_or_else(|| Error::ServiceNotFound(name.to_owned()))?;
		S::from_any(any).ok_or_else(|| Error::ServiceType(name.to_owned()))
	}
}

/// Typed view of a registered service.
pub trait Service: Sized + 'static {
	fn from_any(any: Rc<dyn Any>) -> Option<Self>;
}

impl<S: Any> Service for Rc<S> {
	fn from_any(any: Rc<dyn Any>) -> Option<Self> {
		any.downcast::<S>().ok()
	}
}

impl<T: 'static> Service for Var<T> {
	fn from_any(any: Rc<dyn Any>) -> Option<Self> {
		Var::try_from(any).ok()
	}
}

/// A flat name to service map.
#[derive(Default)]
pub struct Registry {
	services: FxHashMap<String, Rc<dyn Any>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, name: impl Into<String>, service: Rc<dyn Any>) {
		self.services.insert(name.into(), service);
	}

	pub fn with(mut self, name: impl Into<String>, service: Rc<dyn Any>) -> Self {
		self.register(name, service);
		self
	}
}

impl Owner for Registry {
	fn lookup(&self, name: &str) -> Option<Rc<dyn Any>> {
		self.services.get(name).cloned()
	}
}
