use std::cell::{Cell, RefCell};
use std::rc::Weak;

use crate::error::Result;

/// Something that wants to be revalidated at the end of a render pass.
pub trait Reactive {
	fn update(&self) -> Result<()>;
}

thread_local! {
	static STARTED: Cell<bool> = Cell::new(false);
	static FLUSHING: Cell<bool> = Cell::new(false);
	static PENDING: RefCell<Vec<Weak<dyn Reactive>>> = RefCell::new(Vec::new());
}

pub fn in_render() -> bool {
	STARTED.with(|s| s.get())
}

/// Runs `func` as a render pass. Nested passes join the outermost one;
/// when the outermost pass ends every pending invalidation is flushed.
pub fn render(func: impl FnOnce()) -> Result<()> {
	let pass = Pass {
		root: render_start(),
	};
	func();
	if pass.root {
		drop(pass);
		flush()?;
	}

	Ok(())
}

/// Closes the pass it opened, also when the pass unwinds.
struct Pass {
	root: bool,
}

impl Drop for Pass {
	fn drop(&mut self) {
		if self.root {
			STARTED.with(|s| s.set(false));
		}
	}
}

/// Clears the flushing flag, also when an update unwinds.
struct Flushing;

impl Drop for Flushing {
	fn drop(&mut self) {
		FLUSHING.with(|f| f.set(false));
	}
}

fn render_start() -> bool {
	STARTED.with(|s| {
		if !s.get() {
			s.set(true);
			true
		} else {
			false
		}
	})
}

pub(crate) fn schedule(reactive: Weak<dyn Reactive>) {
	PENDING.with(|pending| pending.borrow_mut().push(reactive));
}

/// Number of invalidations waiting for the next flush.
pub fn pending() -> usize {
	PENDING.with(|pending| pending.borrow().len())
}

/// Revalidates everything that was invalidated since the last flush.
///
/// Stops at the first error; whatever was not processed yet stays
/// queued for the next flush.
pub fn flush() -> Result<()> {
	if FLUSHING.with(|f| f.replace(true)) {
		// The outer flush loops until the queue is empty.
		return Ok(());
	}

	let _flushing = Flushing;
	flush_loop()
}

fn flush_loop() -> Result<()> {
	let mut pass = 0usize;
	loop {
		let changed = PENDING.with(|pending| std::mem::take(&mut *pending.borrow_mut()));
		if changed.is_empty() {
			break;
		}

		pass += 1;
		tracing::trace!(pass, pending = changed.len(), "flush");

		let mut changed = changed.into_iter();
		while let Some(reaction) = changed.next() {
			let Some(reactive) = reaction.upgrade() else {
				continue;
			};

			if let Err(err) = reactive.update() {
				PENDING.with(|pending| {
					let mut pending = pending.borrow_mut();
					let newer = std::mem::take(&mut *pending);
					pending.extend(changed);
					pending.extend(newer);
				});
				return Err(err);
			}
		}
	}

	Ok(())
}
