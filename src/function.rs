use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::error::{BoxError, Error, Result};
use crate::{Args, Evaluation, Instance, ModifierManager, Named, Owner, Positional};

/// Cleanup returned by a run of a function-based modifier.
///
/// Invoked once, before the next run or when the element goes away.
/// Invoking consumes it.
pub struct Teardown {
	func: Box<dyn FnOnce() -> Result<(), BoxError>>,
}

impl Teardown {
	pub fn new(func: impl FnOnce() + 'static) -> Self {
		Teardown {
			func: Box::new(move || {
				func();
				Ok(())
			}),
		}
	}

	pub fn fallible(func: impl FnOnce() -> Result<(), BoxError> + 'static) -> Self {
		Teardown {
			func: Box::new(func),
		}
	}

	pub(crate) fn invoke(self) -> Result<(), BoxError> {
		(self.func)()
	}
}

impl fmt::Debug for Teardown {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Teardown")
	}
}

pub type ModifierFn<E, T> =
	dyn Fn(&Evaluation, &E, Positional<'_, T>, Named<'_, T>) -> Result<Option<Teardown>, BoxError>;

/// A modifier written as a single function of the element and its
/// arguments.
pub struct FunctionModifier<E, T> {
	name: &'static str,
	func: Rc<ModifierFn<E, T>>,
}

impl<E, T> Clone for FunctionModifier<E, T> {
	fn clone(&self) -> Self {
		FunctionModifier {
			name: self.name,
			func: self.func.clone(),
		}
	}
}

impl<E, T> FunctionModifier<E, T>
where
	E: 'static,
	T: 'static,
{
	pub fn new<F>(func: F) -> Self
	where
		F: Fn(&Evaluation, &E, Positional<'_, T>, Named<'_, T>) -> Result<Option<Teardown>, BoxError>
			+ 'static,
	{
		Self::named("<anonymous>", func)
	}

	pub fn named<F>(name: &'static str, func: F) -> Self
	where
		F: Fn(&Evaluation, &E, Positional<'_, T>, Named<'_, T>) -> Result<Option<Teardown>, BoxError>
			+ 'static,
	{
		FunctionModifier {
			name,
			func: Rc::new(func),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

pub struct FunctionState<E, T> {
	func: Rc<ModifierFn<E, T>>,
	teardown: Option<Teardown>,
}

impl<E, T> FunctionState<E, T> {
	pub fn has_teardown(&self) -> bool {
		self.teardown.is_some()
	}
}

/// Manager for [`FunctionModifier`]s.
///
/// The function runs inside the instance's tag, so only what it reads can
/// make it run again. Every re-run is preceded by the teardown of the
/// previous one.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionManager;

impl FunctionManager {
	fn run<E, T>(instance: &mut Instance<E, T, FunctionState<E, T>>) -> Result<()>
	where
		E: 'static,
		T: Clone + Hash + 'static,
	{
		let Instance {
			name,
			element,
			args,
			tag,
			state,
			..
		} = instance;
		let name = *name;
		let element = Option::as_ref(element).ok_or(Error::NotInstalled { name })?;

		let teardown = tag
			.track(|cx| (state.func)(cx, element, args.positional(cx), args.named(cx)))
			.map_err(|source| Error::Run { name, source })?;

		tracing::trace!(modifier = name, teardown = teardown.is_some(), "ran");
		state.teardown = teardown;
		Ok(())
	}

	fn teardown<E, T>(instance: &mut Instance<E, T, FunctionState<E, T>>) -> Result<()> {
		match instance.state.teardown.take() {
			Some(teardown) => teardown.invoke().map_err(|source| Error::Teardown {
				name: instance.name,
				source,
			}),
			None => Ok(()),
		}
	}
}

impl<E, T> ModifierManager<E, T> for FunctionManager
where
	E: 'static,
	T: Clone + Hash + 'static,
{
	type Definition = FunctionModifier<E, T>;
	type State = FunctionState<E, T>;

	fn create(
		&self,
		owner: Rc<dyn Owner>,
		definition: &FunctionModifier<E, T>,
		args: Args<T>,
	) -> Result<Instance<E, T, FunctionState<E, T>>> {
		let state = FunctionState {
			func: definition.func.clone(),
			teardown: None,
		};
		Ok(Instance::new(definition.name, owner, args, state))
	}

	fn install(&self, instance: &mut Instance<E, T, FunctionState<E, T>>, element: E) -> Result<()> {
		instance.install_with(element, Self::run)
	}

	fn update(&self, instance: &mut Instance<E, T, FunctionState<E, T>>, args: Args<T>) -> Result<()> {
		instance.update_with(args, |instance, _| {
			// The previous teardown is spent even when the re-run fails.
			Self::teardown(instance)?;
			Self::run(instance)
		})
	}

	fn destroy(&self, instance: &mut Instance<E, T, FunctionState<E, T>>) -> Result<()> {
		instance.destroy_with(|instance, _| Self::teardown(instance), |_, _| Ok(()))
	}
}
