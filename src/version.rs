use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Version {
	Hash(u64),
}

/// A value stored next to its `fxhash` fingerprint.
pub struct Hashed<T> {
	pub value: T,
	pub hash: u64,
}

impl<T> Hashed<T> {
	pub fn new(value: T) -> Self
	where
		T: Hash,
	{
		let hash = fxhash::hash64(&value);
		Self { value, hash }
	}

	pub fn version(&self) -> Version {
		Version::Hash(self.hash)
	}

	pub fn same_as(&self, other: &Hashed<T>) -> bool {
		self.hash == other.hash
	}
}

impl<T: Clone> Clone for Hashed<T> {
	fn clone(&self) -> Self {
		Hashed {
			value: self.value.clone(),
			hash: self.hash,
		}
	}
}

impl<T> Deref for Hashed<T> {
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.value
	}
}

impl<T> Debug for Hashed<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.value.fmt(f)
	}
}
