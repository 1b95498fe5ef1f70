//! Owner - Disposal Scopes
//!
//! An [`Owner`] collects everything that has to be torn down together: effects and
//! memos created while it is current, child owners, and callbacks registered with
//! [`on_cleanup`]. Disposing an owner releases all of it exactly once.
//!
//! A root owner is created with [`Owner::new`] and is only disposed explicitly, which
//! makes it the building block for state whose lifetime is decided by a parent
//! algorithm rather than by the reactive graph (for example, one scope per matched
//! route).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::runtime::NodeId;

type Cleanup = Box<dyn FnOnce() + 'static>;

thread_local! {
	static OWNER_STACK: RefCell<Vec<Owner>> = const { RefCell::new(Vec::new()) };
}

struct OwnerInner {
	id: NodeId,
	cleanups: RefCell<Vec<Cleanup>>,
	children: RefCell<Vec<Owner>>,
	disposed: Cell<bool>,
}

/// A disposal scope for reactive resources
///
/// ## Example
///
/// ```
/// use waymark_reactive::{Owner, on_cleanup};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let released = Rc::new(Cell::new(false));
/// let owner = Owner::new();
///
/// owner.run(|| {
/// 	let released = released.clone();
/// 	on_cleanup(move || released.set(true));
/// });
///
/// owner.dispose();
/// assert!(released.get());
/// ```
#[derive(Clone)]
pub struct Owner {
	inner: Rc<OwnerInner>,
}

impl Owner {
	/// Create a detached root owner.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(OwnerInner {
				id: NodeId::new(),
				cleanups: RefCell::new(Vec::new()),
				children: RefCell::new(Vec::new()),
				disposed: Cell::new(false),
			}),
		}
	}

	/// Create an owner that is disposed together with `self`.
	pub fn child(&self) -> Self {
		let child = Self::new();
		if self.is_disposed() {
			child.inner.disposed.set(true);
		} else {
			let mut children = self.inner.children.borrow_mut();
			children.retain(|c| !c.is_disposed());
			children.push(child.clone());
		}
		child
	}

	/// The owner made current by the innermost [`Owner::run`], if any.
	pub fn current() -> Option<Self> {
		OWNER_STACK
			.try_with(|stack| stack.borrow().last().cloned())
			.ok()
			.flatten()
	}

	/// Run `f` with this owner as the current owner.
	pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
		OWNER_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
		let _guard = OwnerGuard;
		f()
	}

	/// Register a callback to run when this owner is disposed.
	///
	/// If the owner is already disposed the callback runs immediately.
	pub fn on_cleanup(&self, f: impl FnOnce() + 'static) {
		if self.is_disposed() {
			f();
			return;
		}
		self.inner.cleanups.borrow_mut().push(Box::new(f));
	}

	/// Dispose this owner, its children, and everything registered with it.
	///
	/// Children are disposed first (most recent first), then cleanups run in
	/// reverse registration order. Subsequent calls do nothing.
	pub fn dispose(&self) {
		if self.inner.disposed.replace(true) {
			return;
		}

		let children = std::mem::take(&mut *self.inner.children.borrow_mut());
		for child in children.into_iter().rev() {
			child.dispose();
		}

		let cleanups = std::mem::take(&mut *self.inner.cleanups.borrow_mut());
		for cleanup in cleanups.into_iter().rev() {
			cleanup();
		}
	}

	/// Whether [`Owner::dispose`] has been called
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}

	/// Identifier of this owner
	pub fn id(&self) -> NodeId {
		self.inner.id
	}

	/// Number of live child owners
	pub fn child_count(&self) -> usize {
		self.inner
			.children
			.borrow()
			.iter()
			.filter(|c| !c.is_disposed())
			.count()
	}

	/// Number of pending cleanup callbacks (for testing)
	pub fn cleanup_count(&self) -> usize {
		self.inner.cleanups.borrow().len()
	}
}

impl Default for Owner {
	fn default() -> Self {
		Self::new()
	}
}

impl PartialEq for Owner {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for Owner {}

impl fmt::Debug for Owner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Owner")
			.field("id", &self.inner.id)
			.field("cleanups", &self.inner.cleanups.borrow().len())
			.field("children", &self.inner.children.borrow().len())
			.field("disposed", &self.inner.disposed.get())
			.finish()
	}
}

struct OwnerGuard;

impl Drop for OwnerGuard {
	fn drop(&mut self) {
		let _ = OWNER_STACK.try_with(|stack| stack.borrow_mut().pop());
	}
}

/// Register a callback with the current owner.
///
/// Outside of any owner the callback can never run, so it is dropped with a warning.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
	match Owner::current() {
		Some(owner) => owner.on_cleanup(f),
		None => tracing::warn!("on_cleanup called without a current owner; callback dropped"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_cleanups_run_in_reverse_order() {
		let order = Rc::new(RefCell::new(Vec::new()));
		let owner = Owner::new();

		owner.run(|| {
			for i in 0..3 {
				let order = order.clone();
				on_cleanup(move || order.borrow_mut().push(i));
			}
		});
		owner.dispose();

		assert_eq!(*order.borrow(), vec![2, 1, 0]);
	}

	#[rstest]
	#[serial]
	fn test_dispose_is_idempotent() {
		let count = Rc::new(Cell::new(0));
		let owner = Owner::new();
		{
			let count = count.clone();
			owner.on_cleanup(move || count.set(count.get() + 1));
		}

		owner.dispose();
		owner.dispose();

		assert_eq!(count.get(), 1);
		assert!(owner.is_disposed());
	}

	#[rstest]
	#[serial]
	fn test_children_disposed_before_parent_cleanups() {
		let order = Rc::new(RefCell::new(Vec::new()));
		let parent = Owner::new();
		let child = parent.child();

		{
			let order = order.clone();
			parent.on_cleanup(move || order.borrow_mut().push("parent"));
		}
		{
			let order = order.clone();
			child.on_cleanup(move || order.borrow_mut().push("child"));
		}

		parent.dispose();

		assert!(child.is_disposed());
		assert_eq!(*order.borrow(), vec!["child", "parent"]);
	}

	#[rstest]
	#[serial]
	fn test_cleanup_after_dispose_runs_immediately() {
		let ran = Rc::new(Cell::new(false));
		let owner = Owner::new();
		owner.dispose();

		let flag = ran.clone();
		owner.on_cleanup(move || flag.set(true));

		assert!(ran.get());
	}

	#[rstest]
	#[serial]
	fn test_current_owner_nesting() {
		let outer = Owner::new();
		let inner = Owner::new();

		assert!(Owner::current().is_none());
		outer.run(|| {
			assert_eq!(Owner::current(), Some(outer.clone()));
			inner.run(|| assert_eq!(Owner::current(), Some(inner.clone())));
			assert_eq!(Owner::current(), Some(outer.clone()));
		});
		assert!(Owner::current().is_none());
	}

	#[rstest]
	#[serial]
	fn test_on_cleanup_without_owner_is_dropped() {
		let ran = Rc::new(Cell::new(false));
		let flag = ran.clone();

		on_cleanup(move || flag.set(true));

		assert!(!ran.get());
	}
}
