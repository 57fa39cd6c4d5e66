use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::dependencies::Dependencies;
use crate::render::{schedule, Reactive};
use crate::{Derived, Evaluation, Invalid, State};

/// The tracked computation behind one modifier instance.
///
/// A tag remembers what the last run read. The host asks
/// [`Tag::is_valid`] once per flush to decide whether an update is due.
#[derive(Clone)]
pub struct Tag {
	body: Rc<TagBody>,
}

pub struct TagBody {
	inner: RefCell<TagInner>,
}

struct TagInner {
	name: &'static str,
	state: State,
	dependencies: Dependencies,
	listener: Option<Weak<dyn Reactive>>,
	scheduled: bool,
	runs: usize,
	this: Weak<TagBody>,
}

impl Drop for TagInner {
	fn drop(&mut self) {
		let refr = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.release(&refr)
	}
}

impl Tag {
	pub fn new(name: &'static str) -> Self {
		Tag {
			body: Rc::new_cyclic(|this| TagBody {
				inner: RefCell::new(TagInner {
					name,
					state: State::Invalid(Invalid::Definitely),
					dependencies: Dependencies::new(),
					listener: None,
					scheduled: false,
					runs: 0,
					this: this.clone(),
				}),
			}),
		}
	}

	fn this(&self) -> Weak<dyn Derived> {
		Rc::downgrade(&self.body) as Weak<dyn Derived>
	}

	/// Runs `func` while recording its reads, then replaces the previous
	/// read set with the new one. A failed run leaves the tag stale but
	/// still subscribed to whatever it managed to read.
	pub(crate) fn track<R, E>(&self, func: impl FnOnce(&Evaluation) -> Result<R, E>) -> Result<R, E> {
		let this = self.this();
		let evaluation = Evaluation::new(this.clone());
		let result = func(&evaluation);

		let mut inner = self.body.inner.borrow_mut();
		inner.dependencies.swap(evaluation.take(), &this);
		inner.runs += 1;
		inner.state = if result.is_err() {
			State::Invalid(Invalid::Definitely)
		} else if inner.dependencies.are_valid() {
			State::Valid
		} else {
			// A source moved after it was captured or read.
			State::Invalid(Invalid::Maybe)
		};

		tracing::trace!(
			tag = inner.name,
			reads = inner.dependencies.len(),
			valid = inner.state == State::Valid,
			"tracked run"
		);

		// A source moved before or during the run without notifying us:
		// nobody else will schedule the recheck.
		let stale = inner.state == State::Invalid(Invalid::Maybe) && !inner.scheduled;
		let listener = if stale { inner.listener.clone() } else { None };
		if listener.is_some() {
			inner.scheduled = true;
		}
		drop(inner);

		if let Some(listener) = listener {
			schedule(listener);
		}

		result
	}

	/// Runs `func` with an evaluation whose reads are thrown away.
	pub(crate) fn untracked<R>(&self, func: impl FnOnce(&Evaluation) -> R) -> R {
		let this = self.this();
		let evaluation = Evaluation::new(this.clone());
		let result = func(&evaluation);
		evaluation.take().release(&this);
		result
	}

	/// Whether nothing the last run read has changed since.
	pub fn is_valid(&self) -> bool {
		let mut inner = self.body.inner.borrow_mut();
		match inner.state {
			State::Valid => true,
			State::Invalid(Invalid::Definitely) => false,
			State::Invalid(Invalid::Maybe) => {
				// Written and written back: nothing to do.
				let valid = inner.dependencies.are_valid();
				if valid {
					inner.state = State::Valid;
				}
				valid
			}
		}
	}

	pub fn state(&self) -> State {
		self.body.inner.borrow().state
	}

	pub fn dependencies(&self) -> usize {
		self.body.inner.borrow().dependencies.len()
	}

	pub fn runs(&self) -> usize {
		self.body.inner.borrow().runs
	}

	pub fn is_scheduled(&self) -> bool {
		self.body.inner.borrow().scheduled
	}

	/// Registers the reactive that gets scheduled when this tag
	/// is invalidated.
	pub(crate) fn listen(&self, listener: Weak<dyn Reactive>) {
		self.body.inner.borrow_mut().listener = Some(listener);
	}

	/// Marks the scheduled revalidation as consumed.
	pub(crate) fn unschedule(&self) {
		self.body.inner.borrow_mut().scheduled = false;
	}

	/// Drops every subscription. A released tag is never scheduled again.
	pub(crate) fn release(&self) {
		let this = self.this();
		let mut inner = self.body.inner.borrow_mut();
		inner.dependencies.release(&this);
		inner.listener = None;
		inner.scheduled = false;
	}
}

impl Derived for TagBody {
	fn invalidate(self: Rc<Self>, invalid: Invalid) {
		let listener = {
			let mut self_mut = self.inner.borrow_mut();
			match self_mut.state {
				State::Valid => self_mut.state = State::Invalid(invalid),
				State::Invalid(Invalid::Maybe) if invalid == Invalid::Definitely => {
					self_mut.state = State::Invalid(invalid)
				}
				State::Invalid(_) => {}
			}

			if self_mut.scheduled {
				return;
			}

			match self_mut.listener.clone() {
				Some(listener) => {
					self_mut.scheduled = true;
					listener
				}
				None => return,
			}
		};

		tracing::trace!(tag = self.inner.borrow().name, "scheduled");
		schedule(listener);
	}
}

impl std::fmt::Debug for Tag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = self.body.inner.borrow();
		f.debug_struct("Tag")
			.field("name", &inner.name)
			.field("state", &inner.state)
			.field("dependencies", &inner.dependencies.len())
			.finish()
	}
}
