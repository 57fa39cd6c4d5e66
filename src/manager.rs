use std::rc::Rc;

use crate::error::Result;
use crate::{Args, Instance, Owner, Tag};

/// The extension points a host calls for every modifier occurrence.
///
/// Managers carry no per-binding state: one value serves any number of
/// instances, and everything mutable lives on the [`Instance`]. The two
/// implementations, [`FunctionManager`](crate::FunctionManager) and
/// [`ClassManager`](crate::ClassManager), share the lifecycle state
/// machine and differ only in what a run does.
pub trait ModifierManager<E, T>: 'static {
	/// What the user registered: a function or a hook-object type.
	type Definition;
	/// Variant payload stored on the instance.
	type State: 'static;

	fn create(
		&self,
		owner: Rc<dyn Owner>,
		definition: &Self::Definition,
		args: Args<T>,
	) -> Result<Instance<E, T, Self::State>>;

	/// Attaches the element and runs the modifier for the first time.
	fn install(&self, instance: &mut Instance<E, T, Self::State>, element: E) -> Result<()>;

	/// Re-runs the modifier against a new snapshot. Hosts call this only
	/// when [`ModifierManager::tag`] reports a change.
	fn update(&self, instance: &mut Instance<E, T, Self::State>, args: Args<T>) -> Result<()>;

	fn destroy(&self, instance: &mut Instance<E, T, Self::State>) -> Result<()>;

	fn tag<'a>(&self, instance: &'a Instance<E, T, Self::State>) -> &'a Tag {
		instance.tag()
	}
}
