//! Signal - Fine-grained Reactive Primitive
//!
//! `Signal<T>` is the core reactive primitive that holds a value and automatically
//! tracks dependencies when accessed.
//!
//! ## Key Features
//!
//! - **Automatic Dependency Tracking**: When `get()` is called inside an Effect or Memo,
//!   the dependency is automatically recorded.
//! - **Change Notification**: When `set()` or `update()` is called, all dependent
//!   computations re-run before the call returns (or at the end of the enclosing batch).
//! - **Lightweight**: `Signal<T>` is a NodeId plus a shared cell, cheap to clone.
//!
//! ## Example
//!
//! ```
//! use waymark_reactive::Signal;
//!
//! let count = Signal::new(0);
//! assert_eq!(count.get(), 0);
//!
//! count.set(42);
//! assert_eq!(count.get(), 42);
//!
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 43);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::runtime::{NodeId, try_with_runtime, with_runtime};

/// A reactive signal that holds a value and tracks dependencies
///
/// ## Cloning
///
/// `Signal<T>` implements `Clone` and shares the value via `Rc<RefCell<T>>`.
/// All clones of the same Signal share the same underlying value.
pub struct Signal<T: 'static> {
	/// Unique identifier for this signal
	id: NodeId,
	/// The actual value, shared via reference counting
	value: Rc<RefCell<T>>,
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			value: Rc::clone(&self.value),
		}
	}
}

impl<T: 'static> Signal<T> {
	/// Create a new Signal with the given initial value
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			value: Rc::new(RefCell::new(value)),
		}
	}

	/// Get the current value of the signal
	///
	/// This automatically tracks the dependency if called from within an Effect or Memo.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		with_runtime(|rt| rt.track_dependency(self.id));
		self.get_untracked()
	}

	/// Get the current value without tracking dependencies
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Borrow the current value, tracking the dependency.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		with_runtime(|rt| rt.track_dependency(self.id));
		f(&self.value.borrow())
	}

	/// Borrow the current value without tracking.
	pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Set the signal to a new value
	///
	/// This notifies all dependent Effects and Memos that the signal has changed.
	pub fn set(&self, value: T) {
		*self.value.borrow_mut() = value;
		with_runtime(|rt| rt.notify_change(self.id));
	}

	/// Update the signal's value using a function
	///
	/// Dependents are notified once, after `f` returns.
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		f(&mut *self.value.borrow_mut());
		with_runtime(|rt| rt.notify_change(self.id));
	}

	/// Get the NodeId of this signal
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Create a handle that does not keep the value alive.
	pub fn downgrade(&self) -> WeakSignal<T> {
		WeakSignal {
			id: self.id,
			value: Rc::downgrade(&self.value),
		}
	}
}

/// A non-owning reference to a [`Signal`].
///
/// Values that the signal itself holds can refer back to it through a
/// `WeakSignal` without forming a reference cycle.
pub struct WeakSignal<T: 'static> {
	id: NodeId,
	value: Weak<RefCell<T>>,
}

impl<T: 'static> WeakSignal<T> {
	/// The signal, if any strong handle is still alive.
	pub fn upgrade(&self) -> Option<Signal<T>> {
		self.value.upgrade().map(|value| Signal { id: self.id, value })
	}
}

impl<T: 'static> Clone for WeakSignal<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			value: Weak::clone(&self.value),
		}
	}
}

impl<T: 'static> fmt::Debug for WeakSignal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakSignal")
			.field("id", &self.id)
			.field("alive", &(self.value.strong_count() > 0))
			.finish()
	}
}

impl<T: 'static> Drop for Signal<T> {
	fn drop(&mut self) {
		// Only the last clone removes the node from the graph
		if Rc::strong_count(&self.value) == 1 {
			let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::runtime::observe;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_signal_creation() {
		let signal = Signal::new(42);
		assert_eq!(signal.get_untracked(), 42);
	}

	#[rstest]
	#[serial]
	fn test_signal_set_and_update() {
		let signal = Signal::new(0);

		signal.set(100);
		assert_eq!(signal.get_untracked(), 100);

		signal.update(|n| *n *= 2);
		assert_eq!(signal.get_untracked(), 200);
	}

	#[rstest]
	#[serial]
	fn test_signal_clone_shares_value() {
		let signal1 = Signal::new(String::from("a"));
		let signal2 = signal1.clone();

		signal1.set(String::from("b"));

		assert_eq!(signal2.get_untracked(), "b");
		assert_eq!(signal1.id(), signal2.id());
	}

	#[rstest]
	#[serial]
	fn test_signal_with_borrows() {
		let signal = Signal::new(vec![1, 2, 3]);
		let len = signal.with(|v| v.len());
		assert_eq!(len, 3);
	}

	#[rstest]
	#[serial]
	fn test_signal_dependency_tracking() {
		let signal = Signal::new(42);
		let observer_id = NodeId::new();

		{
			let _guard = observe(Some(observer_id));
			let _ = signal.get();
		}

		with_runtime(|rt| {
			assert_eq!(rt.subscriber_count(signal.id()), 1);
			rt.remove_node(observer_id);
		});
	}

	#[rstest]
	#[serial]
	fn test_signal_get_untracked_does_not_track() {
		let signal = Signal::new(1);
		let observer_id = NodeId::new();

		{
			let _guard = observe(Some(observer_id));
			let _ = signal.get_untracked();
		}

		with_runtime(|rt| assert_eq!(rt.subscriber_count(signal.id()), 0));
	}

	#[rstest]
	#[serial]
	fn test_weak_signal_upgrade() {
		let signal = Signal::new(5);
		let weak = signal.downgrade();

		assert_eq!(weak.upgrade().map(|s| s.get_untracked()), Some(5));

		drop(signal);
		assert!(weak.upgrade().is_none());
	}

	#[rstest]
	#[serial]
	fn test_signal_drop_removes_node() {
		let observer_id = NodeId::new();
		let id = {
			let signal = Signal::new(0);
			let _guard = observe(Some(observer_id));
			let _ = signal.get();
			signal.id()
		};

		with_runtime(|rt| {
			assert!(!rt.has_node(id));
			rt.remove_node(observer_id);
		});
	}
}
