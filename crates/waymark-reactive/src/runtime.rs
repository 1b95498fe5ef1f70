//! Reactive Runtime
//!
//! This module provides the core reactive runtime for managing Signal dependencies,
//! Memo/Effect execution, and update propagation.
//!
//! ## Architecture
//!
//! The reactive system uses a synchronous push model:
//!
//! 1. **Observer Stack**: Tracks the currently executing Effect or Memo
//! 2. **Dependency Tracking**: Records a dependency whenever a Signal or Memo is read
//! 3. **Propagation**: A change enqueues every subscriber; the queue is drained
//!    synchronously before the write returns
//! 4. **Batching**: Writes inside [`batch`] only enqueue; the outermost batch drains
//!
//! Computations never run re-entrantly. A write performed while a computation is
//! running is queued and picked up after the running computation returns.
//!
//! ## Example
//!
//! ```
//! use waymark_reactive::{Effect, Signal, batch};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let a = Signal::new(1);
//! let b = Signal::new(2);
//! let runs = Rc::new(Cell::new(0));
//!
//! let _effect = Effect::new({
//! 	let (a, b, runs) = (a.clone(), b.clone(), runs.clone());
//! 	move || {
//! 		let _ = a.get() + b.get();
//! 		runs.set(runs.get() + 1);
//! 	}
//! });
//!
//! batch(|| {
//! 	a.set(10);
//! 	b.set(20);
//! });
//!
//! // One initial run, one run for the whole batch
//! assert_eq!(runs.get(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Upper bound on computations executed in one drain of the update queue.
///
/// Reaching it means a computation keeps invalidating itself.
const MAX_FLUSH_ITERATIONS: usize = 100_000;

/// Unique identifier for reactive nodes (Signals, Memos, Effects, Owners)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Create a new unique NodeId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Dependency graph node
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// IDs of nodes that depend on this node
	pub(crate) subscribers: Vec<NodeId>,
	/// IDs of nodes this node depends on
	pub(crate) dependencies: Vec<NodeId>,
}

/// A node the runtime can re-execute when one of its dependencies changes.
pub(crate) trait Computation {
	/// Re-run the computation.
	fn run(&self);
}

/// Global reactive runtime
///
/// This struct manages the reactive dependency graph and update propagation.
/// It lives in thread-local storage, so each thread gets its own runtime.
pub struct Runtime {
	/// Observer stack; `None` entries mark untracked sections
	observer_stack: RefCell<Vec<Option<NodeId>>>,
	/// Dependency graph: NodeId -> DependencyNode
	pub(crate) dependency_graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	/// Registered computations (Effects and Memos)
	computations: RefCell<BTreeMap<NodeId, Rc<dyn Computation>>>,
	/// Computations waiting to be re-run, in notification order
	pending_updates: RefCell<VecDeque<NodeId>>,
	/// Nesting depth of batches and running computations
	batch_depth: Cell<usize>,
	/// Whether the update queue is currently being drained
	flushing: Cell<bool>,
}

impl Runtime {
	/// Create a new Runtime instance
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			dependency_graph: RefCell::new(BTreeMap::new()),
			computations: RefCell::new(BTreeMap::new()),
			pending_updates: RefCell::new(VecDeque::new()),
			batch_depth: Cell::new(0),
			flushing: Cell::new(false),
		}
	}

	/// Get the current observer (the currently executing Effect or Memo)
	///
	/// Returns `None` outside of computations and inside [`untrack`].
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack.borrow().last().copied().flatten()
	}

	pub(crate) fn push_observer(&self, observer: Option<NodeId>) {
		self.observer_stack.borrow_mut().push(observer);
	}

	pub(crate) fn pop_observer(&self) {
		self.observer_stack.borrow_mut().pop();
	}

	/// Track a dependency between the current observer and a source node
	///
	/// This is called automatically when `Signal::get()` or `Memo::get()` is invoked.
	pub fn track_dependency(&self, source_id: NodeId) {
		if let Some(observer_id) = self.current_observer() {
			if observer_id == source_id {
				return;
			}
			let mut graph = self.dependency_graph.borrow_mut();

			let source_node = graph.entry(source_id).or_default();
			if !source_node.subscribers.contains(&observer_id) {
				source_node.subscribers.push(observer_id);
			}

			let observer_node = graph.entry(observer_id).or_default();
			if !observer_node.dependencies.contains(&source_id) {
				observer_node.dependencies.push(source_id);
			}
		}
	}

	/// Notify that a source node has changed
	///
	/// All subscribers are queued. The queue is drained immediately unless a
	/// batch or a computation is in progress.
	pub fn notify_change(&self, source_id: NodeId) {
		let subscribers = self
			.dependency_graph
			.borrow()
			.get(&source_id)
			.map(|node| node.subscribers.clone())
			.unwrap_or_default();

		if subscribers.is_empty() {
			return;
		}

		{
			let mut pending = self.pending_updates.borrow_mut();
			for subscriber in subscribers {
				if !pending.contains(&subscriber) {
					pending.push_back(subscriber);
				}
			}
		}

		self.flush_if_idle();
	}

	pub(crate) fn register_computation(&self, id: NodeId, computation: Rc<dyn Computation>) {
		self.computations.borrow_mut().insert(id, computation);
	}

	/// Remove a computation and every edge touching it.
	pub(crate) fn unregister_computation(&self, id: NodeId) {
		let removed = self.computations.borrow_mut().remove(&id);
		self.pending_updates.borrow_mut().retain(|pending| *pending != id);
		self.remove_node(id);
		// Dropped last: the computation may own Signals whose Drop re-enters the runtime
		drop(removed);
	}

	/// Run `f` with propagation deferred until it returns.
	pub(crate) fn run_deferred<R>(&self, f: impl FnOnce() -> R) -> R {
		let _guard = DeferGuard::enter(self);
		f()
	}

	fn flush_if_idle(&self) {
		if self.batch_depth.get() == 0 && !self.flushing.get() {
			self.flush();
		}
	}

	/// Drain the update queue, re-running each queued computation once per notification.
	pub fn flush(&self) {
		if self.flushing.replace(true) {
			return;
		}

		let mut iterations = 0usize;
		loop {
			let next = self.pending_updates.borrow_mut().pop_front();
			let Some(id) = next else {
				break;
			};

			iterations += 1;
			if iterations > MAX_FLUSH_ITERATIONS {
				tracing::error!(
					limit = MAX_FLUSH_ITERATIONS,
					"reactive update loop did not settle; dropping pending updates"
				);
				self.pending_updates.borrow_mut().clear();
				break;
			}

			let computation = self.computations.borrow().get(&id).cloned();
			if let Some(computation) = computation {
				self.run_deferred(|| computation.run());
			}
		}

		self.flushing.set(false);
	}

	/// Clear dependencies for a node
	///
	/// This is called before re-executing an Effect/Memo to clear old dependencies.
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.dependency_graph.borrow_mut();

		if let Some(node) = graph.get(&node_id) {
			let dependencies = node.dependencies.clone();

			for dep_id in &dependencies {
				if let Some(dep_node) = graph.get_mut(dep_id) {
					dep_node.subscribers.retain(|&id| id != node_id);
				}
			}
		}

		if let Some(node) = graph.get_mut(&node_id) {
			node.dependencies.clear();
		}
	}

	/// Remove a node from the dependency graph
	///
	/// This is called when a Signal/Memo/Effect is dropped or disposed.
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		let removed = self.dependency_graph.borrow_mut().remove(&node_id);
		if let Some(node) = removed {
			let mut graph = self.dependency_graph.borrow_mut();
			for subscriber in node.subscribers {
				if let Some(sub_node) = graph.get_mut(&subscriber) {
					sub_node.dependencies.retain(|&id| id != node_id);
				}
			}
		}
	}

	/// Check if a node exists in the dependency graph (for testing)
	pub fn has_node(&self, node_id: NodeId) -> bool {
		self.dependency_graph.borrow().contains_key(&node_id)
	}

	/// Get the number of subscribers for a node (for testing)
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.dependency_graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}

	/// Number of computations currently registered (for testing)
	pub fn computation_count(&self) -> usize {
		self.computations.borrow().len()
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Runtime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Runtime")
			.field("nodes", &self.dependency_graph.borrow().len())
			.field("computations", &self.computations.borrow().len())
			.field("pending", &self.pending_updates.borrow().len())
			.field("batch_depth", &self.batch_depth.get())
			.finish()
	}
}

/// Increments the batch depth for its lifetime; drains the queue when the
/// outermost guard is dropped (also on unwind).
struct DeferGuard<'a> {
	runtime: &'a Runtime,
}

impl<'a> DeferGuard<'a> {
	fn enter(runtime: &'a Runtime) -> Self {
		runtime.batch_depth.set(runtime.batch_depth.get() + 1);
		Self { runtime }
	}
}

impl Drop for DeferGuard<'_> {
	fn drop(&mut self) {
		let depth = self.runtime.batch_depth.get().saturating_sub(1);
		self.runtime.batch_depth.set(depth);
		if depth == 0 && !std::thread::panicking() {
			self.runtime.flush_if_idle();
		}
	}
}

/// Pops the observer pushed by [`observe`] when dropped.
pub(crate) struct ObserverGuard;

impl Drop for ObserverGuard {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.pop_observer());
	}
}

/// Make `observer` the current observer until the returned guard is dropped.
pub(crate) fn observe(observer: Option<NodeId>) -> ObserverGuard {
	with_runtime(|rt| rt.push_observer(observer));
	ObserverGuard
}

// Thread-local runtime instance
//
// In WASM, there is only one thread, so this effectively provides a global runtime.
// On non-WASM platforms, each thread gets its own runtime instance.
thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Get a reference to the thread's runtime
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Try to access the runtime (safe version for Drop implementations)
///
/// Returns None if the thread-local storage has been destroyed.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Run `f`, deferring all propagation until it returns.
///
/// Nested batches only drain when the outermost one completes.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
	with_runtime(|rt| rt.run_deferred(f))
}

/// Run `f` without recording dependencies for the current observer.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
	let _guard = observe(None);
	f()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_node_id_uniqueness() {
		let id1 = NodeId::new();
		let id2 = NodeId::new();
		let id3 = NodeId::new();

		assert_ne!(id1, id2);
		assert_ne!(id2, id3);
		assert_ne!(id1, id3);
	}

	#[rstest]
	#[serial]
	fn test_runtime_observer_stack() {
		let runtime = Runtime::new();
		assert!(runtime.current_observer().is_none());

		let id1 = NodeId::new();
		runtime.push_observer(Some(id1));
		assert_eq!(runtime.current_observer(), Some(id1));

		// Untracked section hides the outer observer
		runtime.push_observer(None);
		assert!(runtime.current_observer().is_none());

		runtime.pop_observer();
		assert_eq!(runtime.current_observer(), Some(id1));

		runtime.pop_observer();
		assert!(runtime.current_observer().is_none());
	}

	#[rstest]
	#[serial]
	fn test_dependency_tracking() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();
		let effect_id = NodeId::new();

		runtime.push_observer(Some(effect_id));
		runtime.track_dependency(signal_id);
		runtime.pop_observer();

		let graph = runtime.dependency_graph.borrow();
		assert!(graph[&signal_id].subscribers.contains(&effect_id));
		assert!(graph[&effect_id].dependencies.contains(&signal_id));
	}

	#[rstest]
	#[serial]
	fn test_tracking_outside_observer_is_noop() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();

		runtime.track_dependency(signal_id);

		assert!(!runtime.has_node(signal_id));
	}

	#[rstest]
	#[serial]
	fn test_clear_dependencies() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();
		let effect_id = NodeId::new();

		runtime.push_observer(Some(effect_id));
		runtime.track_dependency(signal_id);
		runtime.pop_observer();

		runtime.clear_dependencies(effect_id);

		let graph = runtime.dependency_graph.borrow();
		assert!(!graph[&signal_id].subscribers.contains(&effect_id));
		assert!(graph[&effect_id].dependencies.is_empty());
	}

	#[rstest]
	#[serial]
	fn test_remove_node_detaches_subscribers() {
		let runtime = Runtime::new();
		let signal_id = NodeId::new();
		let effect_id = NodeId::new();

		runtime.push_observer(Some(effect_id));
		runtime.track_dependency(signal_id);
		runtime.pop_observer();

		runtime.remove_node(signal_id);

		assert!(!runtime.has_node(signal_id));
		let graph = runtime.dependency_graph.borrow();
		assert!(graph[&effect_id].dependencies.is_empty());
	}

	#[rstest]
	#[serial]
	fn test_notify_without_subscribers_is_noop() {
		let runtime = Runtime::new();
		runtime.notify_change(NodeId::new());
		assert!(runtime.pending_updates.borrow().is_empty());
	}
}
