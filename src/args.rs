//! Argument snapshots.
//!
//! The host binds a modifier's arguments as [`ArgSources`]: one [`Value`] per
//! positional slot and per name. Every render pass that may have changed
//! them resolves the sources into a fresh, immutable [`Args`] snapshot.
//!
//! A captured argument remembers where it came from. Reading it through
//! [`Positional`] or [`Named`] records a dependency on that source, at the
//! version that was captured, so only arguments that were actually read can
//! invalidate the modifier.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::{Const, Evaluation, Hashed, Value, Version};

pub struct Arg<T> {
	value: Hashed<T>,
	source: Value<T>,
	/// Version of the source at capture time.
	version: Version,
}

impl<T> Arg<T>
where
	T: Clone + Hash + 'static,
{
	fn capture(source: &Value<T>) -> Self {
		let value = T::clone(&source.get_once());
		Arg {
			value: Hashed::new(value),
			source: source.clone(),
			version: source.version(),
		}
	}

	fn read<'a>(&'a self, eval: &Evaluation) -> &'a T {
		eval.track(self.source.observable(), self.version);
		&self.value.value
	}
}

impl<T: Clone> Clone for Arg<T> {
	fn clone(&self) -> Self {
		Arg {
			value: self.value.clone(),
			source: self.source.clone(),
			version: self.version,
		}
	}
}

/// Immutable capture of positional and named arguments.
pub struct Args<T> {
	positional: SmallVec<[Arg<T>; 4]>,
	named: BTreeMap<String, Arg<T>>,
}

impl<T: Clone> Clone for Args<T> {
	fn clone(&self) -> Self {
		Args {
			positional: self.positional.clone(),
			named: self.named.clone(),
		}
	}
}

impl<T> Default for Args<T> {
	fn default() -> Self {
		Args {
			positional: SmallVec::new(),
			named: BTreeMap::new(),
		}
	}
}

impl<T> Args<T>
where
	T: Clone + Hash + 'static,
{
	pub fn empty() -> Self {
		Self::default()
	}

	/// Snapshot of literal arguments. None of them can ever change.
	pub fn from_values<K>(
		positional: impl IntoIterator<Item = T>,
		named: impl IntoIterator<Item = (K, T)>,
	) -> Self
	where
		K: Into<String>,
	{
		let mut sources = ArgSources::new();
		for value in positional {
			sources = sources.positional(Const::new(value));
		}
		for (key, value) in named {
			sources = sources.named(key, Const::new(value));
		}
		sources.resolve()
	}

	/// Untracked read of a positional argument.
	pub fn peek_positional(&self, index: usize) -> Option<&T> {
		self.positional.get(index).map(|arg| &*arg.value)
	}

	/// Untracked read of a named argument.
	pub fn peek_named(&self, key: &str) -> Option<&T> {
		self.named.get(key).map(|arg| &*arg.value)
	}

	pub fn positional_len(&self) -> usize {
		self.positional.len()
	}

	pub fn named_keys(&self) -> impl Iterator<Item = &str> + '_ {
		self.named.keys().map(String::as_str)
	}

	pub fn positional<'a>(&'a self, eval: &'a Evaluation) -> Positional<'a, T> {
		Positional {
			args: &self.positional,
			eval,
		}
	}

	pub fn named<'a>(&'a self, eval: &'a Evaluation) -> Named<'a, T> {
		Named {
			args: &self.named,
			eval,
		}
	}

	/// Structural comparison against an older snapshot.
	pub fn diff(&self, previous: &Args<T>) -> ArgsDiff {
		let positional = self.positional.len() != previous.positional.len()
			|| self
				.positional
				.iter()
				.zip(previous.positional.iter())
				.any(|(next, prev)| !next.value.same_as(&prev.value));

		let mut named: SmallVec<[String; 4]> = SmallVec::new();
		for (key, next) in &self.named {
			match previous.named.get(key) {
				Some(prev) if prev.value.same_as(&next.value) => {}
				_ => named.push(key.clone()),
			}
		}
		for key in previous.named.keys() {
			if !self.named.contains_key(key) {
				named.push(key.clone());
			}
		}
		named.sort();

		ArgsDiff { positional, named }
	}
}

impl<T> Debug for Args<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Args")
			.field(
				"positional",
				&self.positional.iter().map(|arg| &arg.value).collect::<Vec<_>>(),
			)
			.field(
				"named",
				&self
					.named
					.iter()
					.map(|(key, arg)| (key, &arg.value))
					.collect::<BTreeMap<_, _>>(),
			)
			.finish()
	}
}

/// What changed between two snapshots.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArgsDiff {
	/// Any positional value changed, or the arity did.
	pub positional: bool,
	/// Named keys that changed, appeared or disappeared, sorted.
	pub named: SmallVec<[String; 4]>,
}

impl ArgsDiff {
	pub fn is_empty(&self) -> bool {
		!self.positional && self.named.is_empty()
	}

	pub fn named_changed(&self, key: &str) -> bool {
		self.named.iter().any(|k| k == key)
	}
}

/// Tracked view over the positional arguments.
pub struct Positional<'a, T> {
	args: &'a [Arg<T>],
	eval: &'a Evaluation,
}

impl<'a, T> Clone for Positional<'a, T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<'a, T> Copy for Positional<'a, T> {}

impl<'a, T> Positional<'a, T>
where
	T: Clone + Hash + 'static,
{
	pub fn get(&self, index: usize) -> Option<&'a T> {
		self.args.get(index).map(|arg| arg.read(self.eval))
	}

	/// Arity is part of the template, reading it tracks nothing.
	pub fn len(&self) -> usize {
		self.args.len()
	}

	pub fn is_empty(&self) -> bool {
		self.args.is_empty()
	}

	/// Reads, and therefore tracks, every positional argument.
	pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
		let eval = self.eval;
		self.args.iter().map(move |arg| arg.read(eval))
	}

	pub fn to_vec(&self) -> Vec<T> {
		self.iter().cloned().collect()
	}
}

/// Tracked view over the named arguments.
pub struct Named<'a, T> {
	args: &'a BTreeMap<String, Arg<T>>,
	eval: &'a Evaluation,
}

impl<'a, T> Clone for Named<'a, T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<'a, T> Copy for Named<'a, T> {}

impl<'a, T> Named<'a, T>
where
	T: Clone + Hash + 'static,
{
	pub fn get(&self, key: &str) -> Option<&'a T> {
		self.args.get(key).map(|arg| arg.read(self.eval))
	}

	pub fn contains(&self, key: &str) -> bool {
		self.args.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
		self.args.keys().map(String::as_str)
	}

	/// Reads, and therefore tracks, every named argument.
	pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a T)> + 'a {
		let eval = self.eval;
		self.args
			.iter()
			.map(move |(key, arg)| (key.as_str(), arg.read(eval)))
	}
}

/// The argument references a host binds to one modifier occurrence.
pub struct ArgSources<T> {
	positional: SmallVec<[Value<T>; 4]>,
	named: BTreeMap<String, Value<T>>,
}

impl<T> Clone for ArgSources<T> {
	fn clone(&self) -> Self {
		ArgSources {
			positional: self.positional.clone(),
			named: self.named.clone(),
		}
	}
}

impl<T> Default for ArgSources<T> {
	fn default() -> Self {
		ArgSources {
			positional: SmallVec::new(),
			named: BTreeMap::new(),
		}
	}
}

impl<T> ArgSources<T>
where
	T: Clone + Hash + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	pub fn positional(mut self, source: impl Into<Value<T>>) -> Self {
		self.positional.push(source.into());
		self
	}

	pub fn named(mut self, key: impl Into<String>, source: impl Into<Value<T>>) -> Self {
		self.named.insert(key.into(), source.into());
		self
	}

	/// Captures the current value of every source.
	pub fn resolve(&self) -> Args<T> {
		Args {
			positional: self.positional.iter().map(Arg::capture).collect(),
			named: self
				.named
				.iter()
				.map(|(key, source)| (key.clone(), Arg::capture(source)))
				.collect(),
		}
	}
}
