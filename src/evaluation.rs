use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::dependencies::Dependencies;
use crate::{Derived, Observable, Version};

/// The dependency-recording context of a single tracked run.
///
/// Everything read through an `Evaluation` becomes a dependency of
/// its parent, and a later write to any of it invalidates the parent.
pub struct Evaluation {
	dependencies: RefCell<Dependencies>,
	parent: Weak<dyn Derived>,
}

impl AsRef<Evaluation> for Evaluation {
	fn as_ref(&self) -> &Evaluation {
		self
	}
}

impl Evaluation {
	pub fn new(parent: Weak<dyn Derived>) -> Self {
		Evaluation {
			parent,
			dependencies: RefCell::new(Dependencies::new()),
		}
	}

	pub(crate) fn parent(&self) -> Weak<dyn Derived> {
		self.parent.clone()
	}

	/// Subscribes the parent to `observable` and records the version
	/// the caller observed.
	pub(crate) fn track(&self, observable: Rc<dyn Observable>, version: Version) {
		observable.used_by(self.parent());
		self.dependencies
			.borrow_mut()
			.based_on(observable, version);
	}

	pub fn reads(&self) -> usize {
		self.dependencies.borrow().len()
	}

	pub fn take(self) -> Dependencies {
		self.dependencies.into_inner()
	}
}
