use std::hash::Hash;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::owner::Service;
use crate::{Args, ArgsDiff, Evaluation, Named, Owner, Positional, Tag};

/// Lifecycle of a modifier instance.
///
/// `Pending -> Installed -> Destroying -> Destroyed`, with `Installed`
/// looping on every update. `Destroying` and `Destroyed` are terminal for
/// the host: no lifecycle call is accepted once destruction began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
	Pending,
	Installed,
	Destroying,
	Destroyed,
}

impl Lifecycle {
	pub fn is_destroying(self) -> bool {
		self >= Lifecycle::Destroying
	}

	pub fn is_destroyed(self) -> bool {
		self == Lifecycle::Destroyed
	}
}

/// One modifier bound to one element occurrence.
///
/// `S` is the variant payload: the function and its pending teardown, or
/// the user's hook object.
pub struct Instance<E, T, S> {
	pub(crate) name: &'static str,
	pub(crate) lifecycle: Lifecycle,
	/// The first run failed. Only `destroy` is accepted from here.
	pub(crate) aborted: bool,
	pub(crate) element: Option<E>,
	pub(crate) args: Args<T>,
	pub(crate) owner: Rc<dyn Owner>,
	pub(crate) tag: Tag,
	pub(crate) state: S,
}

impl<E, T, S> Instance<E, T, S> {
	pub(crate) fn new(name: &'static str, owner: Rc<dyn Owner>, args: Args<T>, state: S) -> Self {
		tracing::debug!(modifier = name, "create");
		Instance {
			name,
			lifecycle: Lifecycle::Pending,
			aborted: false,
			element: None,
			args,
			owner,
			tag: Tag::new(name),
			state,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn lifecycle(&self) -> Lifecycle {
		self.lifecycle
	}

	pub fn element(&self) -> Option<&E> {
		self.element.as_ref()
	}

	pub fn args(&self) -> &Args<T> {
		&self.args
	}

	pub fn owner(&self) -> &dyn Owner {
		&*self.owner
	}

	pub fn tag(&self) -> &Tag {
		&self.tag
	}

	pub fn state(&self) -> &S {
		&self.state
	}

	/// Whether install was attempted and failed.
	pub fn is_aborted(&self) -> bool {
		self.aborted
	}

	pub fn is_installed(&self) -> bool {
		self.lifecycle == Lifecycle::Installed
	}

	pub fn is_destroying(&self) -> bool {
		self.lifecycle.is_destroying()
	}

	pub fn is_destroyed(&self) -> bool {
		self.lifecycle.is_destroyed()
	}

	/// Commits the element and performs the first run. A failed first run
	/// leaves the instance pending, without an element, and aborted.
	pub(crate) fn install_with(
		&mut self,
		element: E,
		run: impl FnOnce(&mut Self) -> Result<()>,
	) -> Result<()> {
		match self.lifecycle {
			Lifecycle::Pending if self.aborted => return Err(Error::Aborted { name: self.name }),
			Lifecycle::Pending => {}
			Lifecycle::Installed => return Err(Error::AlreadyInstalled { name: self.name }),
			Lifecycle::Destroying | Lifecycle::Destroyed => {
				return Err(Error::Destroyed { name: self.name })
			}
		}

		tracing::debug!(modifier = self.name, "install");
		self.element = Some(element);
		match run(self) {
			Ok(()) => {
				self.lifecycle = Lifecycle::Installed;
				Ok(())
			}
			Err(err) => {
				tracing::debug!(modifier = self.name, "install aborted");
				self.element = None;
				self.aborted = true;
				Err(err)
			}
		}
	}

	/// Replaces the snapshot and re-runs. `run` gets the snapshot that
	/// was replaced.
	pub(crate) fn update_with(
		&mut self,
		args: Args<T>,
		run: impl FnOnce(&mut Self, &Args<T>) -> Result<()>,
	) -> Result<()> {
		match self.lifecycle {
			Lifecycle::Installed => {}
			Lifecycle::Pending if self.aborted => return Err(Error::Aborted { name: self.name }),
			Lifecycle::Pending => return Err(Error::NotInstalled { name: self.name }),
			Lifecycle::Destroying | Lifecycle::Destroyed => {
				return Err(Error::Destroyed { name: self.name })
			}
		}

		tracing::debug!(modifier = self.name, "update");
		let previous = std::mem::replace(&mut self.args, args);
		run(self, &previous)
	}

	/// Runs the two destruction sub-phases back to back.
	///
	/// `teardown` runs with the element still attached, `finalize` after it
	/// was released. Both receive the lifecycle the instance had before
	/// destruction began. The instance ends up `Destroyed` even when a
	/// phase fails; a failed `teardown` skips `finalize`.
	pub(crate) fn destroy_with(
		&mut self,
		teardown: impl FnOnce(&mut Self, Lifecycle) -> Result<()>,
		finalize: impl FnOnce(&mut Self, Lifecycle) -> Result<()>,
	) -> Result<()> {
		let previous = self.lifecycle;
		if previous.is_destroying() {
			return Err(Error::Destroyed { name: self.name });
		}

		tracing::debug!(modifier = self.name, ?previous, "destroy");
		self.lifecycle = Lifecycle::Destroying;
		self.tag.release();

		let mut result = teardown(self, previous);
		self.element = None;
		if result.is_ok() {
			result = finalize(self, previous);
		}

		self.lifecycle = Lifecycle::Destroyed;
		result
	}
}

impl<E, T, S> std::fmt::Debug for Instance<E, T, S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Instance")
			.field("name", &self.name)
			.field("lifecycle", &self.lifecycle)
			.field("aborted", &self.aborted)
			.field("installed", &self.element.is_some())
			.field("tag", &self.tag)
			.finish()
	}
}

/// What a hook sees of its instance.
///
/// Reads of arguments through [`Context::positional`] and
/// [`Context::named`] are tracked, and so is anything read with the
/// context as the evaluation (`var.get(cx)`).
pub struct Context<'a, E, T> {
	name: &'static str,
	lifecycle: Lifecycle,
	element: Option<&'a E>,
	args: &'a Args<T>,
	owner: &'a dyn Owner,
	changes: Option<&'a ArgsDiff>,
	eval: &'a Evaluation,
}

impl<'a, E, T> Context<'a, E, T> {
	pub(crate) fn new(
		name: &'static str,
		lifecycle: Lifecycle,
		element: Option<&'a E>,
		args: &'a Args<T>,
		owner: &'a dyn Owner,
		changes: Option<&'a ArgsDiff>,
		eval: &'a Evaluation,
	) -> Self {
		Context {
			name,
			lifecycle,
			element,
			args,
			owner,
			changes,
			eval,
		}
	}
}

impl<'a, E, T> Context<'a, E, T>
where
	T: Clone + Hash + 'static,
{
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Absent before install and once teardown completed.
	pub fn element(&self) -> Option<&'a E> {
		self.element
	}

	pub fn args(&self) -> &'a Args<T> {
		self.args
	}

	pub fn positional(&self) -> Positional<'a, T> {
		self.args.positional(self.eval)
	}

	pub fn named(&self) -> Named<'a, T> {
		self.args.named(self.eval)
	}

	/// What changed since the previous snapshot. Only set while
	/// arguments are being updated.
	pub fn changes(&self) -> Option<&'a ArgsDiff> {
		self.changes
	}

	pub fn owner(&self) -> &'a dyn Owner {
		self.owner
	}

	pub fn service<Svc: Service>(&self, name: &str) -> Result<Svc> {
		self.owner.service(name)
	}

	pub fn is_destroying(&self) -> bool {
		self.lifecycle.is_destroying()
	}

	pub fn is_destroyed(&self) -> bool {
		self.lifecycle.is_destroyed()
	}
}

impl<'a, E, T> AsRef<Evaluation> for Context<'a, E, T> {
	fn as_ref(&self) -> &Evaluation {
		self.eval
	}
}
