use std::fmt::Debug;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use crate::{Derived, Evaluation, Observable, Version};

/// A read handle over any observable source. Argument sources are
/// bound as `Value`s so a literal and a `Var` look the same to the host.
pub struct Value<T> {
	value: Rc<dyn Access<T>>,
}

impl<T> Clone for Value<T> {
	fn clone(&self) -> Self {
		Value {
			value: self.value.clone(),
		}
	}
}

impl<T> Value<T>
where
	T: 'static,
{
	pub fn new(value: Rc<dyn Access<T>>) -> Self {
		Value { value }
	}

	#[inline]
	pub fn get(&self, eval: &impl AsRef<Evaluation>) -> Ref<'_, T> {
		self.value.get(eval.as_ref())
	}

	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.value.get_once()
	}

	pub fn version(&self) -> Version {
		self.value.version()
	}

	pub(crate) fn observable(&self) -> Rc<dyn Observable> {
		self.value.clone().observable()
	}
}

impl<T> Debug for Value<T>
where
	T: Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}

pub enum Ref<'a, T> {
	Ref(&'a T),
	Cell(std::cell::Ref<'a, T>),
}

impl<'a, T> Deref for Ref<'a, T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		match self {
			Ref::Cell(guard) => guard.deref(),
			Ref::Ref(t) => t,
		}
	}
}

impl<'a, T: PartialEq> PartialEq<T> for Ref<'a, T> {
	fn eq(&self, other: &T) -> bool {
		self.deref() == other
	}
}

pub trait Access<T>: Observable {
	fn get(&self, tracker: &Evaluation) -> Ref<'_, T>;
	fn get_once(&self) -> Ref<'_, T>;
	fn observable(self: Rc<Self>) -> Rc<dyn Observable>;
}

/// A value that never changes, e.g. a literal template argument.
pub struct Const<T> {
	body: Rc<ConstBody<T>>,
}

impl<T> Clone for Const<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

struct ConstBody<T> {
	value: T,
}

impl<T> Const<T> {
	pub fn new(value: T) -> Self {
		Const {
			body: Rc::new(ConstBody { value }),
		}
	}

	pub fn get(&self) -> &T {
		&self.body.value
	}
}

impl<T> Observable for ConstBody<T>
where
	T: 'static,
{
	fn version(&self) -> Version {
		Version::Hash(0)
	}

	fn used_by(&self, _: Weak<dyn Derived>) {}
	fn not_used_by(&self, _: &Weak<dyn Derived>) {}
}

impl<T> Access<T> for ConstBody<T>
where
	T: 'static,
{
	fn get(&self, _: &Evaluation) -> Ref<'_, T> {
		Ref::Ref(&self.value)
	}

	fn get_once(&self) -> Ref<'_, T> {
		Ref::Ref(&self.value)
	}

	fn observable(self: Rc<Self>) -> Rc<dyn Observable> {
		self
	}
}

impl<T> From<Const<T>> for Value<T>
where
	T: 'static,
{
	fn from(value: Const<T>) -> Self {
		Value::new(value.body)
	}
}

impl<T> Debug for Const<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get().fmt(f)
	}
}
