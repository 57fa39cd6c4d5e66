use std::hash::Hash;
use std::rc::Rc;

use crate::error::{BoxError, Error, Hook, Result};
use crate::{Args, ArgsDiff, Context, Instance, Lifecycle, ModifierManager, Owner};

/// A modifier written as a stateful object with lifecycle hooks.
///
/// Every hook is optional. Hooks run in a fixed order:
///
/// - install: [`create`](ClassModifier::create), `did_receive_arguments`,
///   `did_install`;
/// - every update: `did_update_arguments`, `did_receive_arguments`;
/// - destroy: `will_remove`, `will_destroy`.
///
/// Install and update hooks are tracked: whatever they read through the
/// context decides when the next update happens.
#[allow(unused_variables)]
pub trait ClassModifier<E, T>: 'static {
	/// Builds the object. Services are available from the owner already.
	fn create(owner: &dyn Owner, args: &Args<T>) -> Result<Self, BoxError>
	where
		Self: Sized;

	fn did_receive_arguments(&mut self, cx: &Context<'_, E, T>) -> Result<(), BoxError> {
		Ok(())
	}

	fn did_update_arguments(&mut self, cx: &Context<'_, E, T>) -> Result<(), BoxError> {
		Ok(())
	}

	fn did_install(&mut self, cx: &Context<'_, E, T>) -> Result<(), BoxError> {
		Ok(())
	}

	fn will_remove(&mut self, cx: &Context<'_, E, T>) -> Result<(), BoxError> {
		Ok(())
	}

	fn will_destroy(&mut self, cx: &Context<'_, E, T>) -> Result<(), BoxError> {
		Ok(())
	}
}

type Factory<E, T> = dyn Fn(&dyn Owner, &Args<T>) -> Result<Box<dyn ClassModifier<E, T>>, BoxError>;

/// Registration of a [`ClassModifier`] type.
pub struct ClassDefinition<E, T> {
	name: &'static str,
	factory: Rc<Factory<E, T>>,
}

impl<E, T> Clone for ClassDefinition<E, T> {
	fn clone(&self) -> Self {
		ClassDefinition {
			name: self.name,
			factory: self.factory.clone(),
		}
	}
}

impl<E, T> ClassDefinition<E, T>
where
	E: 'static,
	T: 'static,
{
	pub fn of<M: ClassModifier<E, T>>() -> Self {
		Self::named::<M>(std::any::type_name::<M>())
	}

	pub fn named<M: ClassModifier<E, T>>(name: &'static str) -> Self {
		ClassDefinition {
			name,
			factory: Rc::new(
				|owner: &dyn Owner, args: &Args<T>| -> Result<Box<dyn ClassModifier<E, T>>, BoxError> {
					Ok(Box::new(M::create(owner, args)?))
				},
			),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

pub struct ClassState<E, T> {
	object: Box<dyn ClassModifier<E, T>>,
	changes: ArgsDiff,
}

impl<E, T> ClassState<E, T> {
	/// What the most recent update changed.
	pub fn changes(&self) -> &ArgsDiff {
		&self.changes
	}
}

/// Manager for hook-object modifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassManager;

enum Phase {
	Install,
	Update,
}

impl ClassManager {
	/// Runs the install or update hook pair inside the instance's tag.
	fn run<E, T>(instance: &mut Instance<E, T, ClassState<E, T>>, phase: Phase) -> Result<()>
	where
		E: 'static,
		T: Clone + Hash + 'static,
	{
		let Instance {
			name,
			lifecycle,
			element,
			args,
			owner,
			tag,
			state,
			..
		} = instance;
		let name = *name;
		let element = Option::as_ref(element);
		let ClassState { object, changes } = state;

		let hooks = match phase {
			Phase::Install => [Hook::DidReceiveArguments, Hook::DidInstall],
			Phase::Update => [Hook::DidUpdateArguments, Hook::DidReceiveArguments],
		};
		let changes = match phase {
			Phase::Install => None,
			Phase::Update => Some(&*changes),
		};

		tag.track(|eval| -> Result<()> {
			let cx = Context::new(name, *lifecycle, element, args, &**owner, changes, eval);
			for hook in hooks {
				tracing::trace!(modifier = name, %hook, "hook");
				let result = match hook {
					Hook::DidReceiveArguments => object.did_receive_arguments(&cx),
					Hook::DidUpdateArguments => object.did_update_arguments(&cx),
					Hook::DidInstall => object.did_install(&cx),
					Hook::WillRemove | Hook::WillDestroy => Ok(()),
				};
				result.map_err(|source| Error::Hook { name, hook, source })?;
			}
			Ok(())
		})
	}

	/// Runs one destruction hook. Reads are not tracked any more.
	fn dispatch<E, T>(instance: &mut Instance<E, T, ClassState<E, T>>, hook: Hook) -> Result<()>
	where
		E: 'static,
		T: Clone + Hash + 'static,
	{
		let Instance {
			name,
			lifecycle,
			element,
			args,
			owner,
			tag,
			state,
			..
		} = instance;
		let name = *name;
		let element = Option::as_ref(element);

		tag.untracked(|eval| {
			let cx = Context::new(name, *lifecycle, element, args, &**owner, None, eval);
			tracing::trace!(modifier = name, %hook, "hook");
			let result = match hook {
				Hook::WillRemove => state.object.will_remove(&cx),
				Hook::WillDestroy => state.object.will_destroy(&cx),
				_ => Ok(()),
			};
			result.map_err(|source| Error::Hook { name, hook, source })
		})
	}
}

impl<E, T> ModifierManager<E, T> for ClassManager
where
	E: 'static,
	T: Clone + Hash + 'static,
{
	type Definition = ClassDefinition<E, T>;
	type State = ClassState<E, T>;

	fn create(
		&self,
		owner: Rc<dyn Owner>,
		definition: &ClassDefinition<E, T>,
		args: Args<T>,
	) -> Result<Instance<E, T, ClassState<E, T>>> {
		let object = (definition.factory)(&*owner, &args).map_err(|source| Error::Construction {
			name: definition.name,
			source,
		})?;

		let state = ClassState {
			object,
			changes: ArgsDiff::default(),
		};
		Ok(Instance::new(definition.name, owner, args, state))
	}

	fn install(&self, instance: &mut Instance<E, T, ClassState<E, T>>, element: E) -> Result<()> {
		instance.install_with(element, |instance| Self::run(instance, Phase::Install))
	}

	fn update(&self, instance: &mut Instance<E, T, ClassState<E, T>>, args: Args<T>) -> Result<()> {
		instance.update_with(args, |instance, previous| {
			instance.state.changes = instance.args.diff(previous);
			Self::run(instance, Phase::Update)
		})
	}

	fn destroy(&self, instance: &mut Instance<E, T, ClassState<E, T>>) -> Result<()> {
		instance.destroy_with(
			|instance, previous| match previous {
				// Never attached, nothing to remove from.
				Lifecycle::Pending => Ok(()),
				_ => Self::dispatch(instance, Hook::WillRemove),
			},
			|instance, _| Self::dispatch(instance, Hook::WillDestroy),
		)
	}
}
