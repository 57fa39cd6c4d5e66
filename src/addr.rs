use std::cmp::Ordering;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Pointers that can be ordered by the address they point at.
pub trait Pointer {
	fn addr(&self) -> *const ();
}

impl<T: ?Sized> Pointer for Rc<T> {
	fn addr(&self) -> *const () {
		Rc::as_ptr(self) as *const ()
	}
}

impl<T: ?Sized> Pointer for Weak<T> {
	fn addr(&self) -> *const () {
		Weak::as_ptr(self) as *const ()
	}
}

/// Identity wrapper: two `Addr`s are equal when they point at the
/// same allocation, whatever the vtable of the fat pointer says.
pub struct Addr<P: Pointer> {
	ptr: P,
}

impl<P: Pointer> Addr<P> {
	pub fn new(ptr: P) -> Self {
		Addr { ptr }
	}
}

impl<P: Pointer> Deref for Addr<P> {
	type Target = P;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<P: Pointer> PartialEq for Addr<P> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr.addr() == other.ptr.addr()
	}
}

impl<P: Pointer> Eq for Addr<P> {}

impl<P: Pointer> Ord for Addr<P> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.ptr.addr().cmp(&other.ptr.addr())
	}
}

impl<P: Pointer> PartialOrd for Addr<P> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

pub type RcAddr<T> = Addr<Rc<T>>;
pub type WeakAddr<T> = Addr<Weak<T>>;
