use std::cell::RefCell;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::render::Reactive;
use crate::{ArgSources, Instance, Lifecycle, ModifierManager, Owner, Tag};

/// A minimal host for one modifier occurrence.
///
/// Owns the argument sources, the manager and the instance. Writes to
/// anything the modifier read schedule a revalidation that runs when the
/// current render pass flushes.
pub struct Binding<M, E, T>
where
	M: ModifierManager<E, T>,
{
	body: Rc<BindingBody<M, E, T>>,
}

impl<M, E, T> Clone for Binding<M, E, T>
where
	M: ModifierManager<E, T>,
{
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub struct BindingBody<M, E, T>
where
	M: ModifierManager<E, T>,
{
	name: &'static str,
	manager: M,
	sources: ArgSources<T>,
	tag: Tag,
	instance: RefCell<Instance<E, T, M::State>>,
}

impl<M, E, T> Binding<M, E, T>
where
	M: ModifierManager<E, T>,
	E: 'static,
	T: Clone + Hash + 'static,
{
	pub fn create(
		manager: M,
		owner: Rc<dyn Owner>,
		definition: &M::Definition,
		sources: ArgSources<T>,
	) -> Result<Self> {
		let instance = manager.create(owner, definition, sources.resolve())?;
		let tag = manager.tag(&instance).clone();
		let body = Rc::new(BindingBody {
			name: instance.name(),
			manager,
			sources,
			tag,
			instance: RefCell::new(instance),
		});

		let listener = Rc::downgrade(&body) as Weak<dyn Reactive>;
		body.tag.listen(listener);

		Ok(Binding { body })
	}

	/// The element appeared.
	pub fn insert(&self, element: E) -> Result<()> {
		let body = &self.body;
		let mut instance = body.borrow_mut()?;
		body.manager.install(&mut instance, element)
	}

	/// Updates the modifier if anything it read changed. Returns whether
	/// an update ran.
	pub fn revalidate(&self) -> Result<bool> {
		self.body.revalidate()
	}

	/// The element went away.
	pub fn remove(&self) -> Result<()> {
		let body = &self.body;
		let mut instance = body.borrow_mut()?;
		body.manager.destroy(&mut instance)
	}

	pub fn tag(&self) -> &Tag {
		&self.body.tag
	}

	pub fn lifecycle(&self) -> Result<Lifecycle> {
		self.with(|instance| instance.lifecycle())
	}

	/// Inspects the instance. Fails with [`Error::Reentrant`] when called
	/// from inside one of the modifier's own lifecycle calls.
	pub fn with<R>(&self, func: impl FnOnce(&Instance<E, T, M::State>) -> R) -> Result<R> {
		let body = &self.body;
		let instance = body
			.instance
			.try_borrow()
			.map_err(|_| Error::Reentrant { name: body.name })?;
		Ok(func(&instance))
	}
}

impl<M, E, T> BindingBody<M, E, T>
where
	M: ModifierManager<E, T>,
	E: 'static,
	T: Clone + Hash + 'static,
{
	fn borrow_mut(&self) -> Result<std::cell::RefMut<'_, Instance<E, T, M::State>>> {
		self.instance
			.try_borrow_mut()
			.map_err(|_| Error::Reentrant { name: self.name })
	}

	fn revalidate(&self) -> Result<bool> {
		self.tag.unschedule();

		let mut instance = self.borrow_mut()?;
		if !instance.is_installed() || self.manager.tag(&instance).is_valid() {
			return Ok(false);
		}

		self.manager.update(&mut instance, self.sources.resolve())?;
		Ok(true)
	}
}

impl<M, E, T> Reactive for BindingBody<M, E, T>
where
	M: ModifierManager<E, T>,
	E: 'static,
	T: Clone + Hash + 'static,
{
	fn update(&self) -> Result<()> {
		self.revalidate().map(|_| ())
	}
}
