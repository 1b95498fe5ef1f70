//! Memo - Cached Derived Values
//!
//! `Memo<T>` caches the result of a computation over other reactive values.
//! It recomputes when a dependency changes and only notifies its own subscribers
//! when the recomputed value differs (`PartialEq`) from the cached one.
//!
//! [`Memo::with_previous`] hands the computation its previous value, which is how
//! incremental computations (such as reconciling a list against its last state)
//! return the old value unchanged to stop propagation.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::owner::Owner;
use super::runtime::{Computation, NodeId, observe, try_with_runtime, with_runtime};

struct MemoComputation<T: 'static, F> {
	id: NodeId,
	value: Weak<RefCell<T>>,
	f: RefCell<F>,
	disposed: Rc<Cell<bool>>,
}

impl<T, F> Computation for MemoComputation<T, F>
where
	T: PartialEq + 'static,
	F: FnMut(Option<&T>) -> T + 'static,
{
	fn run(&self) {
		if self.disposed.get() {
			return;
		}
		let Some(value) = self.value.upgrade() else {
			return;
		};
		let Ok(mut f) = self.f.try_borrow_mut() else {
			tracing::warn!(memo = ?self.id, "memo re-entered while computing; skipped");
			return;
		};

		with_runtime(|rt| rt.clear_dependencies(self.id));
		let next = {
			let _guard = observe(Some(self.id));
			let previous = value.borrow();
			f(Some(&*previous))
		};

		if *value.borrow() != next {
			*value.borrow_mut() = next;
			with_runtime(|rt| rt.notify_change(self.id));
		}
	}
}

/// A cached, reactive derived value
///
/// ## Example
///
/// ```
/// use waymark_reactive::{Memo, Signal};
///
/// let first = Signal::new(String::from("Ada"));
/// let greeting = Memo::new({
/// 	let first = first.clone();
/// 	move || format!("Hello, {}", first.get())
/// });
///
/// first.set(String::from("Grace"));
/// assert_eq!(greeting.get(), "Hello, Grace");
/// ```
pub struct Memo<T: 'static> {
	id: NodeId,
	value: Rc<RefCell<T>>,
	disposed: Rc<Cell<bool>>,
	owned: bool,
}

impl<T: 'static> Clone for Memo<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			value: Rc::clone(&self.value),
			disposed: Rc::clone(&self.disposed),
			owned: self.owned,
		}
	}
}

impl<T: PartialEq + 'static> Memo<T> {
	/// Create a memo from a computation without access to its previous value.
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		Self::with_previous(move |_| f())
	}

	/// Create a memo whose computation receives the previously cached value.
	///
	/// The first run receives `None`. Returning a value equal to the previous
	/// one leaves subscribers untouched.
	pub fn with_previous<F>(mut f: F) -> Self
	where
		F: FnMut(Option<&T>) -> T + 'static,
	{
		let id = NodeId::new();
		let disposed = Rc::new(Cell::new(false));

		let initial = with_runtime(|rt| {
			rt.run_deferred(|| {
				let _guard = observe(Some(id));
				f(None)
			})
		});
		let value = Rc::new(RefCell::new(initial));

		let computation = Rc::new(MemoComputation {
			id,
			value: Rc::downgrade(&value),
			f: RefCell::new(f),
			disposed: Rc::clone(&disposed),
		});
		with_runtime(|rt| rt.register_computation(id, computation));

		let owned = match Owner::current() {
			Some(owner) => {
				let disposed = Rc::clone(&disposed);
				owner.on_cleanup(move || dispose_memo(id, &disposed));
				true
			}
			None => false,
		};

		Self {
			id,
			value,
			disposed,
			owned,
		}
	}
}

impl<T: 'static> Memo<T> {
	/// Get the cached value, tracking the dependency.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		with_runtime(|rt| rt.track_dependency(self.id));
		self.value.borrow().clone()
	}

	/// Get the cached value without tracking.
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Borrow the cached value, tracking the dependency.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		with_runtime(|rt| rt.track_dependency(self.id));
		f(&self.value.borrow())
	}

	/// Borrow the cached value without tracking.
	pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Get the NodeId of this memo
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Stop recomputing; the last value stays readable.
	pub fn dispose(&self) {
		dispose_memo(self.id, &self.disposed);
	}

	/// Whether this memo has been disposed
	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}
}

fn dispose_memo(id: NodeId, disposed: &Cell<bool>) {
	if disposed.replace(true) {
		return;
	}
	let _ = try_with_runtime(|rt| rt.unregister_computation(id));
}

impl<T: 'static> Drop for Memo<T> {
	fn drop(&mut self) {
		if !self.owned && Rc::strong_count(&self.value) == 1 {
			dispose_memo(self.id, &self.disposed);
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Memo<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Memo")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.field("disposed", &self.disposed.get())
			.finish()
	}
}
