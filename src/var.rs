use std::any::Any;
use std::cell::{Ref, RefCell};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::addr::WeakAddr;
use crate::evaluation::Evaluation;
use crate::value::{Access, Value};
use crate::{Derived, Hashed, Invalid, Observable, Version};

/// A mutable reactive cell.
///
/// Reading it through an [`Evaluation`] subscribes the evaluation's parent;
/// a write that changes the value's hash invalidates every subscriber.
pub struct Var<T> {
	body: Rc<VarBody<T>>,
}

impl<T: 'static> From<Var<T>> for Rc<dyn Any> {
	fn from(var: Var<T>) -> Self {
		var.body
	}
}

impl<T: 'static> TryFrom<Rc<dyn Any>> for Var<T> {
	type Error = Rc<dyn Any>;
	fn try_from(value: Rc<dyn Any>) -> Result<Self, Self::Error> {
		Rc::downcast::<VarBody<T>>(value).map(|body| Var { body })
	}
}

pub struct VarBody<T> {
	name: &'static str,
	value: RefCell<Hashed<T>>,
	used_by: RefCell<BTreeSet<WeakAddr<dyn Derived>>>,
	this: Weak<VarBody<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Var<T>
where
	T: Default + Hash + 'static,
{
	fn default() -> Self {
		Var::new(Default::default())
	}
}

pub trait Toggle {
	fn toggle(&mut self);
}

impl Toggle for bool {
	fn toggle(&mut self) {
		*self = !*self
	}
}

impl<T> Var<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self
	where
		T: Hash,
	{
		Self::named("<var>", value)
	}

	/// A cell with a name that shows up in traces.
	pub fn named(name: &'static str, value: T) -> Self
	where
		T: Hash,
	{
		Var {
			body: Rc::new_cyclic(|this| VarBody {
				name,
				value: RefCell::new(Hashed::new(value)),
				used_by: RefCell::new(BTreeSet::new()),
				this: this.clone(),
			}),
		}
	}

	#[inline]
	pub fn get(&self, eval: &impl AsRef<Evaluation>) -> Ref<'_, T> {
		self.body.get(eval.as_ref())
	}

	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.get_once()
	}

	#[inline]
	pub fn set(&self, value: T)
	where
		T: Hash,
	{
		self.body.set(value)
	}

	#[inline]
	pub fn toggle(&self)
	where
		T: Toggle + Hash,
	{
		self.update(T::toggle)
	}

	#[inline]
	pub fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		self.body.replace(value)
	}

	#[inline]
	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		self.body.update(func)
	}

	/// Number of live computations currently subscribed to this cell.
	pub fn subscribers(&self) -> usize {
		self.body
			.used_by
			.borrow()
			.iter()
			.filter(|item| item.strong_count() > 0)
			.count()
	}
}

impl<T: 'static> VarBody<T> {
	pub fn get_once(&self) -> Ref<'_, T> {
		Ref::map(self.value.borrow(), |s| &s.value)
	}

	pub fn get(&self, eval: &Evaluation) -> Ref<'_, T> {
		let value = self.value.borrow();
		if let Some(this) = self.this.upgrade() {
			eval.track(this, value.version());
		}
		Ref::map(value, |v| &v.value)
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		let changed = {
			let mut value = self.value.borrow_mut();
			func(&mut value.value);
			let hash = fxhash::hash64(&value.value);
			let changed = value.hash != hash;
			value.hash = hash;
			changed
		};

		if changed {
			self.invalidate()
		}
	}

	pub fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		let new = Hashed::new(value);
		let old = std::mem::replace(&mut *self.value.borrow_mut(), new);
		if old.hash != self.value.borrow().hash {
			self.invalidate();
		}

		old.value
	}

	pub fn set(&self, value: T)
	where
		T: Hash,
	{
		let _ = self.replace(value);
	}

	fn invalidate(&self) {
		// Subscribers may unsubscribe while being notified.
		let subscribers: SmallVec<[Rc<dyn Derived>; 4]> = {
			let mut used_by = self.used_by.borrow_mut();
			used_by.retain(|item| item.strong_count() > 0);
			used_by.iter().filter_map(|item| item.upgrade()).collect()
		};

		tracing::trace!(var = self.name, subscribers = subscribers.len(), "changed");
		for item in subscribers {
			item.invalidate(Invalid::Maybe)
		}
	}
}

impl<T: 'static> Observable for VarBody<T> {
	fn version(&self) -> Version {
		self.value.borrow().version()
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		self.used_by.borrow_mut().insert(WeakAddr::new(derived));
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		self.used_by
			.borrow_mut()
			.remove(&WeakAddr::new(derived.clone()));
	}
}

impl<T> Access<T> for VarBody<T>
where
	T: 'static,
{
	fn get(&self, eval: &Evaluation) -> crate::value::Ref<'_, T> {
		crate::value::Ref::Cell(VarBody::get(self, eval))
	}

	fn get_once(&self) -> crate::value::Ref<'_, T> {
		crate::value::Ref::Cell(VarBody::get_once(self))
	}

	fn observable(self: Rc<Self>) -> Rc<dyn Observable> {
		self
	}
}

impl<T> From<Var<T>> for Value<T>
where
	T: 'static,
{
	fn from(var: Var<T>) -> Self {
		Value::new(var.body)
	}
}

impl<T> Hash for Var<T>
where
	T: Hash,
{
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		state.write_u64(self.body.value.borrow().hash);
	}
}

impl<T> Debug for Var<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Var")
			.field("name", &self.body.name)
			.field("value", &*self.get_once())
			.finish()
	}
}
