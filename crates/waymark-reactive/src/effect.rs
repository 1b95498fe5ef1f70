//! Effect - Reactive Side Effects
//!
//! `Effect` represents a side effect that automatically re-runs when its dependencies change.
//! Dependencies are tracked automatically - any Signal or Memo read inside the effect
//! closure becomes a dependency.
//!
//! An effect created while an [`Owner`](crate::Owner) is current belongs to that owner:
//! it stays alive after its handle is dropped and is disposed together with the owner.
//! An unowned effect is disposed when its handle is dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::owner::Owner;
use super::runtime::{Computation, NodeId, observe, try_with_runtime, with_runtime};

/// Type alias for effect functions
type EffectFn = Box<dyn FnMut() + 'static>;

struct EffectComputation {
	id: NodeId,
	f: RefCell<EffectFn>,
	disposed: Rc<Cell<bool>>,
}

impl Computation for EffectComputation {
	fn run(&self) {
		if self.disposed.get() {
			return;
		}
		let Ok(mut f) = self.f.try_borrow_mut() else {
			tracing::warn!(effect = ?self.id, "effect re-entered while running; skipped");
			return;
		};

		with_runtime(|rt| rt.clear_dependencies(self.id));
		let _guard = observe(Some(self.id));
		f();
	}
}

/// A reactive effect that automatically re-runs when its dependencies change
///
/// ## Example
///
/// ```
/// use waymark_reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let doubled = Signal::new(0);
///
/// let _effect = Effect::new({
/// 	let (count, doubled) = (count.clone(), doubled.clone());
/// 	move || doubled.set(count.get() * 2)
/// });
///
/// count.set(5);
/// assert_eq!(doubled.get_untracked(), 10);
/// ```
pub struct Effect {
	/// Unique identifier for this effect
	id: NodeId,
	/// Whether this effect has been disposed
	disposed: Rc<Cell<bool>>,
	/// Whether an owner controls this effect's lifetime
	owned: bool,
}

impl Effect {
	/// Create a new Effect that runs the given function
	///
	/// The function runs immediately, and re-runs whenever any
	/// Signal or Memo it reads changes.
	pub fn new<F>(f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		let id = NodeId::new();
		let disposed = Rc::new(Cell::new(false));
		let computation = Rc::new(EffectComputation {
			id,
			f: RefCell::new(Box::new(f)),
			disposed: Rc::clone(&disposed),
		});

		with_runtime(|rt| rt.register_computation(id, computation.clone()));

		let owned = match Owner::current() {
			Some(owner) => {
				let disposed = Rc::clone(&disposed);
				owner.on_cleanup(move || dispose_effect(id, &disposed));
				true
			}
			None => false,
		};

		with_runtime(|rt| rt.run_deferred(|| computation.run()));

		Self { id, disposed, owned }
	}

	/// Get the NodeId of this effect
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Whether this effect has been disposed
	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}

	/// Dispose this effect
	///
	/// After calling this, the effect will no longer run and its resources are released.
	pub fn dispose(&self) {
		dispose_effect(self.id, &self.disposed);
	}
}

fn dispose_effect(id: NodeId, disposed: &Cell<bool>) {
	if disposed.replace(true) {
		return;
	}
	let _ = try_with_runtime(|rt| rt.unregister_computation(id));
}

impl Drop for Effect {
	fn drop(&mut self) {
		if !self.owned {
			self.dispose();
		}
	}
}

impl std::fmt::Debug for Effect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Effect")
			.field("id", &self.id)
			.field("disposed", &self.disposed.get())
			.field("owned", &self.owned)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Signal;
	use crate::runtime::batch;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_effect_runs_immediately() {
		let run_count = Rc::new(Cell::new(0));
		let counter = run_count.clone();

		let _effect = Effect::new(move || counter.set(counter.get() + 1));

		assert_eq!(run_count.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_effect_reruns_on_signal_change() {
		let signal = Signal::new(0);
		let values = Rc::new(RefCell::new(Vec::new()));

		let _effect = Effect::new({
			let signal = signal.clone();
			let values = values.clone();
			move || values.borrow_mut().push(signal.get())
		});

		signal.set(10);
		signal.set(20);

		assert_eq!(*values.borrow(), vec![0, 10, 20]);
	}

	#[rstest]
	#[serial]
	fn test_effect_batched_writes_run_once() {
		let a = Signal::new(1);
		let b = Signal::new(2);
		let sums = Rc::new(RefCell::new(Vec::new()));

		let _effect = Effect::new({
			let (a, b, sums) = (a.clone(), b.clone(), sums.clone());
			move || sums.borrow_mut().push(a.get() + b.get())
		});

		batch(|| {
			a.set(10);
			b.set(20);
		});

		assert_eq!(*sums.borrow(), vec![3, 30]);
	}

	#[rstest]
	#[serial]
	fn test_effect_dispose() {
		let signal = Signal::new(0);
		let run_count = Rc::new(Cell::new(0));

		let effect = Effect::new({
			let signal = signal.clone();
			let counter = run_count.clone();
			move || {
				let _ = signal.get();
				counter.set(counter.get() + 1);
			}
		});

		effect.dispose();
		signal.set(10);

		assert!(effect.is_disposed());
		assert_eq!(run_count.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_unowned_effect_drop_cleans_up() {
		let signal = Signal::new(0);
		let run_count = Rc::new(Cell::new(0));

		{
			let signal = signal.clone();
			let counter = run_count.clone();
			let _effect = Effect::new(move || {
				let _ = signal.get();
				counter.set(counter.get() + 1);
			});
		}

		signal.set(10);
		assert_eq!(run_count.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_owned_effect_outlives_handle() {
		let signal = Signal::new(0);
		let run_count = Rc::new(Cell::new(0));
		let owner = Owner::new();

		owner.run(|| {
			let signal = signal.clone();
			let counter = run_count.clone();
			let _effect = Effect::new(move || {
				let _ = signal.get();
				counter.set(counter.get() + 1);
			});
		});

		signal.set(1);
		assert_eq!(run_count.get(), 2);

		owner.dispose();
		signal.set(2);
		assert_eq!(run_count.get(), 2);
	}

	#[rstest]
	#[serial]
	fn test_effect_write_during_run_is_deferred() {
		let source = Signal::new(1);
		let mirror = Signal::new(0);
		let observed = Rc::new(RefCell::new(Vec::new()));

		let _writer = Effect::new({
			let (source, mirror) = (source.clone(), mirror.clone());
			move || mirror.set(source.get() * 100)
		});
		let _reader = Effect::new({
			let (mirror, observed) = (mirror.clone(), observed.clone());
			move || observed.borrow_mut().push(mirror.get())
		});

		source.set(2);

		assert_eq!(*observed.borrow(), vec![100, 200]);
	}
}
