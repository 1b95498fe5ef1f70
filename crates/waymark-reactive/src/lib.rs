//! Waymark Reactive - fine-grained reactivity for route reconciliation.
//!
//! This crate provides the small reactive core the router is driven by:
//!
//! - [`Signal`]: a source value with automatic dependency tracking
//! - [`Memo`]: a cached derived value that only notifies when it changes
//! - [`Effect`]: a side effect that re-runs when its dependencies change
//! - [`Owner`]: a disposal scope owning effects, memos, child scopes and
//!   cleanup callbacks
//!
//! Everything runs synchronously on the current thread. A write to a
//! [`Signal`] propagates through memos and effects before `set()` returns,
//! unless the write happens inside [`batch`], in which case propagation is
//! deferred until the outermost batch completes.
//!
//! ## Example
//!
//! ```
//! use waymark_reactive::{Effect, Memo, Signal};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let count = Signal::new(1);
//! let doubled = Memo::new({
//! 	let count = count.clone();
//! 	move || count.get() * 2
//! });
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let _effect = Effect::new({
//! 	let doubled = doubled.clone();
//! 	let seen = seen.clone();
//! 	move || seen.borrow_mut().push(doubled.get())
//! });
//!
//! count.set(5);
//! assert_eq!(*seen.borrow(), vec![2, 10]);
//! ```

#![warn(missing_docs)]

mod effect;
mod memo;
mod owner;
pub mod runtime;
mod signal;

pub use effect::Effect;
pub use memo::Memo;
pub use owner::{Owner, on_cleanup};
pub use runtime::{NodeId, batch, untrack, with_runtime};
pub use signal::{Signal, WeakSignal};
