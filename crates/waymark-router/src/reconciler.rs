//! Reconciling matched chains into route contexts.
//!
//! [`ContextReconciler::reconcile`] turns a new match sequence into a
//! [`ContextTree`], reusing the previous tree depth by depth:
//!
//! - a depth whose route key is unchanged keeps its context and only has its
//!   match updated;
//! - at the first depth whose key differs, the previous contexts from that
//!   depth down are disposed (deepest first) before any replacement is built;
//! - when the new chain is shorter, the surplus previous contexts are disposed
//!   and nothing is rebuilt;
//! - when every depth is reused and the length is unchanged, the previous tree
//!   is returned as is.
//!
//! All writes of one pass happen inside a single batch, so observers never see
//! updated matches next to a stale tree. Enter hooks of newly created contexts
//! run after the new tree is committed, root first, inside each context's
//! scope.

use std::rc::Rc;

use tracing::{debug, warn};
use waymark_reactive::{Owner, Signal, batch, untrack};
use waymark_routes::{EnterArgs, RouteMatch, merge_params};

use super::context::{ContextTree, RouteContext};
use super::error::RouterError;

/// Result of one reconciliation pass.
#[derive(Debug)]
pub struct Reconciliation {
	/// The committed tree.
	pub tree: ContextTree,
	/// Contexts kept from the previous tree.
	pub reused: usize,
	/// Contexts created in this pass.
	pub created: usize,
	/// Previous contexts disposed in this pass.
	pub disposed: usize,
	/// First enter hook failure, if any.
	pub error: Option<RouterError>,
}

impl Reconciliation {
	/// Whether the previous tree was kept unchanged.
	pub fn is_unchanged(&self) -> bool {
		self.created == 0 && self.disposed == 0
	}
}

/// Maintains the context tree across match changes.
pub struct ContextReconciler {
	owner: Owner,
	tree: Signal<ContextTree>,
	base: Rc<str>,
}

impl ContextReconciler {
	/// Reconciler with its own root scope.
	///
	/// `base` is the router base used by [`RouteContext::resolve_path`].
	pub fn new(base: &str) -> Self {
		Self::with_owner(Owner::new(), base)
	}

	/// Reconciler whose root contexts are children of `owner`.
	pub fn with_owner(owner: Owner, base: &str) -> Self {
		Self {
			owner,
			tree: Signal::new(ContextTree::default()),
			base: Rc::from(base),
		}
	}

	/// The committed tree, without tracking.
	pub fn tree(&self) -> ContextTree {
		self.tree.get_untracked()
	}

	/// The committed tree as a signal, for tracked reads.
	pub fn tree_signal(&self) -> &Signal<ContextTree> {
		&self.tree
	}

	/// The committed root context.
	pub fn root(&self) -> Option<RouteContext> {
		self.tree.with_untracked(|tree| tree.root().cloned())
	}

	/// Reconciles the committed tree with `matches`.
	///
	/// `location` is passed to enter hooks.
	pub fn reconcile(&mut self, matches: &[RouteMatch], location: &str) -> Reconciliation {
		// Observers run once, after the whole pass is committed.
		let pass = batch(|| self.commit(matches));

		if pass.fresh.is_empty() && pass.disposed == 0 {
			return Reconciliation {
				tree: pass.tree,
				reused: pass.reused,
				created: 0,
				disposed: 0,
				error: None,
			};
		}

		let error = run_enter_hooks(&pass.tree, matches, &pass.fresh, location);
		Reconciliation {
			tree: pass.tree,
			reused: pass.reused,
			created: pass.fresh.len(),
			disposed: pass.disposed,
			error,
		}
	}

	fn commit(&self, matches: &[RouteMatch]) -> Pass {
		let previous = self.tree.get_untracked();
		let mut next: Vec<RouteContext> = Vec::with_capacity(matches.len());
		let mut fresh = Vec::new();
		let mut reused = 0;
		let mut disposed = 0;
		let mut diverged = false;

		for (depth, route_match) in matches.iter().enumerate() {
			if !diverged {
				if let Some(context) = previous.get(depth) {
					if context.key() == route_match.key() {
						context.update_match(route_match.clone());
						next.push(context.clone());
						reused += 1;
						continue;
					}
				}
				disposed += dispose_from(&previous, depth);
				diverged = true;
			}

			let scope = next
				.last()
				.map_or_else(|| self.owner.child(), |parent| parent.owner().child());
			let context = RouteContext::new(
				depth,
				route_match.clone(),
				scope,
				self.tree.downgrade(),
				Rc::clone(&self.base),
			);
			debug!(
				depth,
				route = %route_match.key(),
				pattern = route_match.pattern(),
				"route context created"
			);
			next.push(context);
			fresh.push(depth);
		}

		if !diverged {
			disposed += dispose_from(&previous, matches.len());
		}

		if fresh.is_empty() && disposed == 0 {
			return Pass {
				tree: previous,
				reused,
				fresh,
				disposed,
			};
		}

		let tree = ContextTree::new(next);
		self.tree.set(tree.clone());
		Pass {
			tree,
			reused,
			fresh,
			disposed,
		}
	}

	/// Disposes every context and commits an empty tree.
	pub fn clear(&mut self) -> usize {
		let previous = self.tree.get_untracked();
		let disposed = dispose_from(&previous, 0);
		if !previous.is_empty() {
			self.tree.set(ContextTree::default());
		}
		disposed
	}
}

impl std::fmt::Debug for ContextReconciler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ContextReconciler")
			.field("depth", &self.tree.with_untracked(ContextTree::len))
			.field("base", &self.base)
			.finish()
	}
}

/// Outcome of the write phase of a reconciliation.
struct Pass {
	tree: ContextTree,
	reused: usize,
	fresh: Vec<usize>,
	disposed: usize,
}

/// Disposes `tree[from..]`, deepest first, returning how many were live.
fn dispose_from(tree: &ContextTree, from: usize) -> usize {
	let mut count = 0;
	for depth in (from..tree.len()).rev() {
		let Some(context) = tree.get(depth) else {
			continue;
		};
		if context.is_disposed() {
			continue;
		}
		debug!(depth, route = %context.key(), "route context disposed");
		context.dispose();
		count += 1;
	}
	count
}

fn run_enter_hooks(
	tree: &ContextTree,
	matches: &[RouteMatch],
	fresh: &[usize],
	location: &str,
) -> Option<RouterError> {
	let params = merge_params(matches);
	let mut first_error = None;

	for &depth in fresh {
		let (Some(context), Some(route_match)) = (tree.get(depth), matches.get(depth)) else {
			continue;
		};
		let Some(hook) = route_match.route().definition().enter_hook() else {
			continue;
		};

		let args = EnterArgs {
			params: &params,
			path: route_match.path(),
			pattern: route_match.pattern(),
			original_path: route_match.original_path(),
			location,
		};
		if let Err(source) = context.run(|| untrack(|| hook(&args))) {
			warn!(
				route = route_match.original_path(),
				error = %source,
				"enter hook failed"
			);
			if first_error.is_none() {
				first_error = Some(RouterError::EnterHook {
					route: route_match.original_path().to_string(),
					source,
				});
			}
		}
	}

	first_error
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use waymark_reactive::Effect;
	use waymark_routes::{
		Branch, MatchOptions, PatternLimits, RouteDefinition, build_branches, match_path,
	};

	fn branches() -> Vec<Branch> {
		let routes = vec![
			RouteDefinition::new("/").component("Root").child(
				RouteDefinition::new(":lang")
					.component("Lang")
					.child(RouteDefinition::new("page").component("Page"))
					.child(RouteDefinition::new("other").component("Other")),
			),
			RouteDefinition::new("about").component("About"),
		];
		build_branches(&routes, "", &PatternLimits::default()).unwrap()
	}

	fn matches(branches: &[Branch], path: &str) -> Vec<RouteMatch> {
		match_path(branches, path, &MatchOptions::default())
	}

	#[rstest]
	#[serial(reactive)]
	fn test_first_pass_creates_every_depth() {
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");

		let outcome = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");

		assert_eq!(outcome.created, 3);
		assert_eq!(outcome.reused, 0);
		assert_eq!(outcome.tree.len(), 3);
		assert_eq!(reconciler.root().map(|r| r.depth()), Some(0));
	}

	#[rstest]
	#[serial(reactive)]
	fn test_same_keys_return_same_tree() {
		// Arrange
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let first = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");

		// Act
		let second = reconciler.reconcile(&matches(&branches, "/fr/page"), "/fr/page");

		// Assert
		assert!(second.is_unchanged());
		assert!(second.tree.ptr_eq(&first.tree));
		assert_eq!(second.reused, 3);
		assert_eq!(second.tree.get(1).unwrap().local_params().get("lang"), Some("fr"));
	}

	#[rstest]
	#[serial(reactive)]
	fn test_changed_leaf_replaces_only_leaf() {
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let first = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");

		let second = reconciler.reconcile(&matches(&branches, "/en/other"), "/en/other");

		assert_eq!((second.reused, second.created, second.disposed), (2, 1, 1));
		assert!(second.tree.get(0).unwrap().ptr_eq(first.tree.get(0).unwrap()));
		assert!(second.tree.get(1).unwrap().ptr_eq(first.tree.get(1).unwrap()));
		assert!(first.tree.get(2).unwrap().is_disposed());
		assert!(!second.tree.get(2).unwrap().is_disposed());
	}

	#[rstest]
	#[serial(reactive)]
	fn test_shrink_disposes_trailing_only() {
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let first = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");

		let second = reconciler.reconcile(&matches(&branches, "/en"), "/en");

		assert_eq!((second.reused, second.created, second.disposed), (2, 0, 1));
		assert!(first.tree.get(2).unwrap().is_disposed());
		assert!(!second.tree.ptr_eq(&first.tree));
		assert_eq!(second.tree.len(), 2);
	}

	#[rstest]
	#[serial(reactive)]
	fn test_empty_matches_dispose_everything() {
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let first = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");

		let second = reconciler.reconcile(&matches(&branches, "/en/unknown/x"), "/en/unknown/x");

		assert_eq!(second.disposed, 3);
		assert!(second.tree.root().is_none());
		assert!(first.tree.iter().all(RouteContext::is_disposed));
	}

	#[rstest]
	#[serial(reactive)]
	fn test_root_change_disposes_whole_subtree_first() {
		// Arrange
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let log = Rc::new(std::cell::RefCell::new(Vec::new()));
		let first = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");
		for context in &first.tree {
			let log = log.clone();
			let depth = context.depth();
			context.on_cleanup(move || log.borrow_mut().push(depth));
		}

		// Act
		let second = reconciler.reconcile(&matches(&branches, "/about"), "/about");

		// Assert
		assert_eq!(*log.borrow(), vec![2, 1, 0]);
		assert_eq!((second.created, second.disposed), (1, 3));
	}

	#[rstest]
	#[serial(reactive)]
	fn test_child_and_parent_lookup() {
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let outcome = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");
		let root = outcome.tree.root().unwrap().clone();

		let lang = root.child().unwrap();
		let page = lang.outlet().unwrap();

		assert!(page.child().is_none());
		assert!(page.parent().unwrap().ptr_eq(&lang));
		assert!(root.parent().is_none());
		assert_eq!(page.params().get("lang"), Some("en"));
	}

	#[rstest]
	#[serial(reactive)]
	fn test_disposed_context_is_detached() {
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let first = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");
		let old_page = first.tree.get(2).unwrap().clone();

		reconciler.reconcile(&matches(&branches, "/en/other"), "/en/other");

		assert!(old_page.parent().is_none());
		assert_eq!(old_page.params().get("lang"), None);
	}

	#[rstest]
	#[serial(reactive)]
	fn test_observers_see_only_committed_trees() {
		// Arrange
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		let first = reconciler.reconcile(&matches(&branches, "/en/page"), "/en/page");
		let lang = first.tree.get(1).unwrap().clone();
		let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
		let _effect = Effect::new({
			let seen = seen.clone();
			let lang = lang.clone();
			move || {
				let code = lang.local_params().get("lang").map(str::to_string);
				let child = lang.child().map(|child| child.pattern());
				seen.borrow_mut().push((code, child));
			}
		});

		// Act
		reconciler.reconcile(&matches(&branches, "/fr/other"), "/fr/other");

		// Assert
		let entry = |code: &str, pattern: &str| (Some(code.to_string()), Some(pattern.to_string()));
		assert_eq!(
			*seen.borrow(),
			vec![entry("en", "/:lang/page"), entry("fr", "/:lang/other")]
		);
	}

	#[rstest]
	#[serial(reactive)]
	fn test_clear() {
		let branches = branches();
		let mut reconciler = ContextReconciler::new("");
		reconciler.reconcile(&matches(&branches, "/en"), "/en");

		assert_eq!(reconciler.clear(), 2);
		assert!(reconciler.tree().is_empty());
	}
}
