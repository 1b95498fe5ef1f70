//! Route contexts: one live node per matched depth.
//!
//! A [`RouteContext`] is created by the reconciler when a route enters the
//! matched chain and disposed when it leaves. While it is alive its match is
//! updated in place, so a parameter change does not recreate it.
//!
//! Contexts do not point at each other. Parent and child are looked up by
//! depth in the committed [`ContextTree`], which the contexts reach through a
//! weak handle.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use waymark_reactive::{Owner, Signal, WeakSignal};
use waymark_routes::{Params, Route, RouteContent, RouteKey, RouteMatch};

use super::location::resolve_path;

/// The committed chain of contexts, root first.
///
/// Equality is identity: two trees are equal only if they are the same
/// allocation, which is what lets an unchanged reconciliation stop
/// propagation.
#[derive(Clone)]
pub struct ContextTree(Rc<[RouteContext]>);

impl ContextTree {
	pub(crate) fn new(contexts: Vec<RouteContext>) -> Self {
		Self(contexts.into())
	}

	/// The depth-0 context, if anything matched.
	pub fn root(&self) -> Option<&RouteContext> {
		self.0.first()
	}

	/// The deepest context.
	pub fn leaf(&self) -> Option<&RouteContext> {
		self.0.last()
	}

	/// Context at `depth`.
	pub fn get(&self, depth: usize) -> Option<&RouteContext> {
		self.0.get(depth)
	}

	/// Number of contexts.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether nothing matched.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Contexts root first.
	pub fn iter(&self) -> std::slice::Iter<'_, RouteContext> {
		self.0.iter()
	}

	/// Whether both trees are the same allocation.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Default for ContextTree {
	fn default() -> Self {
		Self::new(Vec::new())
	}
}

impl PartialEq for ContextTree {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl fmt::Debug for ContextTree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.0.iter()).finish()
	}
}

impl<'a> IntoIterator for &'a ContextTree {
	type Item = &'a RouteContext;
	type IntoIter = std::slice::Iter<'a, RouteContext>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

struct ContextInner {
	depth: usize,
	key: RouteKey,
	route_match: Signal<RouteMatch>,
	owner: Owner,
	tree: WeakSignal<ContextTree>,
	base: Rc<str>,
}

/// A live matched route.
///
/// Accessors that read the match are tracked: reading them inside an effect
/// or memo subscribes to in-place match updates.
#[derive(Clone)]
pub struct RouteContext {
	inner: Rc<ContextInner>,
}

impl RouteContext {
	pub(crate) fn new(
		depth: usize,
		route_match: RouteMatch,
		owner: Owner,
		tree: WeakSignal<ContextTree>,
		base: Rc<str>,
	) -> Self {
		Self {
			inner: Rc::new(ContextInner {
				depth,
				key: route_match.key().clone(),
				route_match: Signal::new(route_match),
				owner,
				tree,
				base,
			}),
		}
	}

	/// Position in the matched chain, zero for the root.
	pub fn depth(&self) -> usize {
		self.inner.depth
	}

	/// Identity key of the route this context was created for.
	pub fn key(&self) -> &RouteKey {
		&self.inner.key
	}

	/// The current match at this depth.
	pub fn route_match(&self) -> RouteMatch {
		self.inner.route_match.get()
	}

	/// The matched route.
	pub fn route(&self) -> Arc<Route> {
		self.inner.route_match.with(|m| Arc::clone(m.route()))
	}

	/// Joined pattern of the matched route.
	pub fn pattern(&self) -> String {
		self.inner.route_match.with(|m| m.pattern().to_string())
	}

	/// Path prefix consumed up to and including this depth.
	pub fn path(&self) -> String {
		self.inner.route_match.with(|m| m.path().to_string())
	}

	/// The alias the route was declared with.
	pub fn original_path(&self) -> String {
		self.inner
			.route_match
			.with(|m| m.original_path().to_string())
	}

	/// Parameters bound at this depth only.
	pub fn local_params(&self) -> Params {
		self.inner.route_match.with(|m| m.params().clone())
	}

	/// Parameters merged over the whole matched chain.
	///
	/// Falls back to [`RouteContext::local_params`] once the context has left
	/// the committed tree.
	pub fn params(&self) -> Params {
		let merged = self.with_tree(|tree| {
			let mut merged = Params::new();
			for context in tree {
				context
					.inner
					.route_match
					.with(|m| merged.merge(m.params()));
			}
			merged
		});
		merged.unwrap_or_else(|| self.local_params())
	}

	/// What the matched route renders.
	pub fn content(&self) -> Option<RouteContent> {
		self.inner
			.route_match
			.with(|m| m.route().definition().content().cloned())
	}

	/// Metadata attached to the matched route's definition.
	pub fn info(&self) -> Option<serde_json::Value> {
		self.inner
			.route_match
			.with(|m| m.route().definition().info().cloned())
	}

	/// The context one level up, or `None` for the root.
	pub fn parent(&self) -> Option<RouteContext> {
		let depth = self.inner.depth.checked_sub(1)?;
		self.with_tree(|tree| tree.get(depth).cloned()).flatten()
	}

	/// The context one level down, if the chain continues.
	pub fn child(&self) -> Option<RouteContext> {
		let depth = self.inner.depth + 1;
		self.with_tree(|tree| tree.get(depth).cloned()).flatten()
	}

	/// The context whose content renders inside this one.
	///
	/// Same as [`RouteContext::child`]; a renderer shows the outlet's content
	/// wherever this route places its outlet.
	pub fn outlet(&self) -> Option<RouteContext> {
		self.child()
	}

	/// Renders this context and everything below it, innermost first.
	///
	/// `render` receives each context together with the already-rendered
	/// outlet.
	///
	/// # Example
	///
	/// ```
	/// use waymark_router::Router;
	/// use waymark_routes::RouteDefinition;
	///
	/// let router = Router::builder()
	/// 	.route(
	/// 		RouteDefinition::new("users")
	/// 			.component("Users")
	/// 			.child(RouteDefinition::new(":id").component("User")),
	/// 	)
	/// 	.initial_path("/users/7")
	/// 	.build()
	/// 	.unwrap();
	///
	/// let html = router.root().unwrap().compose(&mut |context, outlet: Option<String>| {
	/// 	format!("<{}>{}</>", context.pattern(), outlet.unwrap_or_default())
	/// });
	/// assert_eq!(html, "</users></users/:id></></>");
	/// ```
	pub fn compose<V>(&self, render: &mut dyn FnMut(&RouteContext, Option<V>) -> V) -> V {
		let outlet = self.outlet().map(|child| child.compose(&mut *render));
		render(self, outlet)
	}

	/// Resolves `to` relative to this route's matched path.
	pub fn resolve_path(&self, to: &str) -> Option<String> {
		let from = self.path();
		resolve_path(&self.inner.base, to, Some(&from))
	}

	/// The disposal scope of this context.
	pub fn owner(&self) -> &Owner {
		&self.inner.owner
	}

	/// Runs `f` with this context's scope as the current owner.
	pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
		self.inner.owner.run(f)
	}

	/// Registers a callback to run when this context is disposed.
	pub fn on_cleanup(&self, f: impl FnOnce() + 'static) {
		self.inner.owner.on_cleanup(f);
	}

	/// Whether this context has been disposed.
	pub fn is_disposed(&self) -> bool {
		self.inner.owner.is_disposed()
	}

	/// Whether both handles refer to the same context.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	pub(crate) fn dispose(&self) {
		self.inner.owner.dispose();
	}

	pub(crate) fn update_match(&self, next: RouteMatch) {
		if self.inner.route_match.with_untracked(|current| *current != next) {
			self.inner.route_match.set(next);
		}
	}

	pub(crate) fn path_untracked(&self) -> String {
		self.inner
			.route_match
			.with_untracked(|m| m.path().to_string())
	}

	/// Runs `f` on the committed tree, provided this context is part of it.
	fn with_tree<R>(&self, f: impl FnOnce(&ContextTree) -> R) -> Option<R> {
		if self.is_disposed() {
			return None;
		}
		let tree = self.inner.tree.upgrade()?;
		tree.with(|tree| {
			tree.get(self.inner.depth)
				.is_some_and(|current| current.ptr_eq(self))
				.then(|| f(tree))
		})
	}
}

impl PartialEq for RouteContext {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl fmt::Debug for RouteContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteContext")
			.field("depth", &self.inner.depth)
			.field("key", &self.inner.key)
			.field("path", &self.path_untracked())
			.field("disposed", &self.is_disposed())
			.finish()
	}
}
