use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::addr::RcAddr;
use crate::{Derived, Observable, Version};

/// The read set of one tracked run: every observable that was read,
/// together with the version it had at that moment.
#[derive(Default)]
pub struct Dependencies {
	based_on: BTreeMap<RcAddr<dyn Observable>, Version>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.based_on.len()
	}

	pub fn is_empty(&self) -> bool {
		self.based_on.is_empty()
	}

	/// Records a read. The first version seen during a run wins, so a
	/// write that happens later in the same run still reads as a change.
	pub fn based_on(&mut self, observable: Rc<dyn Observable>, version: Version) {
		self.based_on
			.entry(RcAddr::new(observable))
			.or_insert(version);
	}

	pub fn are_valid(&self) -> bool {
		self.based_on
			.iter()
			.all(|(base, version)| base.version() == *version)
	}

	/// Unsubscribes `parent` from everything and forgets the read set.
	pub fn release(&mut self, parent: &Weak<dyn Derived>) {
		for item in std::mem::take(&mut self.based_on).keys() {
			item.not_used_by(parent)
		}
	}

	pub fn swap(&mut self, next: Dependencies, parent: &Weak<dyn Derived>) {
		let prev = std::mem::replace(&mut self.based_on, next.based_on);

		// Drop subscriptions the new run no longer reads.
		prev.keys()
			.filter(|k| !self.based_on.contains_key(*k))
			.for_each(|k| k.not_used_by(parent));
	}
}
