//! The reactive router.
//!
//! [`Router`] wires the pieces together:
//!
//! ```text
//! location ─┐
//!           ├─> matches ─> params
//! branches ─┘      │
//!                  └─────> contexts (reconciled)
//! ```
//!
//! `location` and `branches` are signals; `matches`, `params` and the context
//! tree are memos. A path change that yields the same match sequence stops at
//! `matches`; one that reuses every context stops at the context tree.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, warn};
use waymark_reactive::{Memo, Owner, Signal, batch, untrack};
use waymark_routes::{
	Branch, Params, RouteContent, RouteDefinition, RouteMatch, build_branches, match_path,
	merge_params,
};

use super::config::RouterConfig;
use super::context::{ContextTree, RouteContext};
use super::error::RouterError;
use super::location::{Location, resolve_path};
use super::navigate::{NavigateOptions, Navigator};
use super::output::Output;
use super::reconciler::ContextReconciler;

type HookError = Rc<RefCell<Option<RouterError>>>;

/// Builder for [`Router`].
pub struct RouterBuilder {
	config: RouterConfig,
	routes: Vec<RouteDefinition>,
	root: Option<RouteContent>,
	navigator: Option<Rc<dyn Navigator>>,
	output: Option<Output>,
	initial_path: String,
}

impl Default for RouterBuilder {
	fn default() -> Self {
		Self {
			config: RouterConfig::default(),
			routes: Vec::new(),
			root: None,
			navigator: None,
			output: None,
			initial_path: "/".to_string(),
		}
	}
}

impl RouterBuilder {
	/// Sets the configuration.
	pub fn config(mut self, config: RouterConfig) -> Self {
		self.config = config;
		self
	}

	/// Appends a root-level route definition.
	pub fn route(mut self, route: RouteDefinition) -> Self {
		self.routes.push(route);
		self
	}

	/// Appends several root-level route definitions.
	pub fn routes(mut self, routes: impl IntoIterator<Item = RouteDefinition>) -> Self {
		self.routes.extend(routes);
		self
	}

	/// Wraps all routes in a pathless root route rendering `content`.
	pub fn root(mut self, content: RouteContent) -> Self {
		self.root = Some(content);
		self
	}

	/// Sets the host navigator.
	pub fn navigator(mut self, navigator: impl Navigator + 'static) -> Self {
		self.navigator = Some(Rc::new(navigator));
		self
	}

	/// Records every committed match sequence into `output`.
	pub fn output(mut self, output: Output) -> Self {
		self.output = Some(output);
		self
	}

	/// Sets the location the router starts at.
	pub fn initial_path(mut self, href: impl Into<String>) -> Self {
		self.initial_path = href.into();
		self
	}

	/// Compiles the routes and resolves the initial location.
	///
	/// An enter hook failure on the initial location does not fail the build;
	/// it is available from [`Router::take_error`].
	///
	/// # Errors
	///
	/// Returns [`RouterError::Config`] for an invalid configuration and
	/// [`RouterError::Routes`] for a malformed route tree.
	pub fn build(self) -> Result<Router, RouterError> {
		let config = self.config.validate()?;
		let definitions = with_root(self.routes, self.root.as_ref());
		let branches: Arc<[Branch]> =
			build_branches(&definitions, &config.base, &config.limits())?.into();

		let owner = Owner::current().map_or_else(Owner::new, |parent| parent.child());
		let location = Signal::new(Location::parse(&self.initial_path));
		let branches = Signal::new(branches);
		let hook_error: HookError = Rc::new(RefCell::new(None));

		let (matches, params, states) = owner.run(|| {
			batch(|| {
				let matches = match_memo(&location, &branches, &config);
				let params = Memo::new({
					let matches = matches.clone();
					move || matches.with(|m| merge_params(m))
				});
				let reconciler = ContextReconciler::with_owner(owner.clone(), &config.base);
				let states = states_memo(
					reconciler,
					&matches,
					&location,
					self.output.clone(),
					Rc::clone(&hook_error),
				);
				(matches, params, states)
			})
		});

		debug!(base = %config.base, "router created");
		Ok(Router {
			config,
			location,
			branches,
			matches,
			params,
			states,
			owner,
			root: self.root,
			navigator: self.navigator,
			output: self.output,
			hook_error,
		})
	}
}

fn with_root(routes: Vec<RouteDefinition>, root: Option<&RouteContent>) -> Vec<RouteDefinition> {
	match root {
		Some(content) => vec![
			RouteDefinition::layout()
				.with_content(content.clone())
				.with_children(routes),
		],
		None => routes,
	}
}

fn match_memo(
	location: &Signal<Location>,
	branches: &Signal<Arc<[Branch]>>,
	config: &RouterConfig,
) -> Memo<Vec<RouteMatch>> {
	let location = location.clone();
	let branches = branches.clone();
	let options = config.match_options();
	Memo::new(move || {
		let pathname = location.with(|l| l.pathname.clone());
		let matches = branches.with(|branches| match_path(branches, &pathname, &options));
		if matches.is_empty() {
			warn!(path = %pathname, "no route matches");
		}
		matches
	})
}

fn states_memo(
	reconciler: ContextReconciler,
	matches: &Memo<Vec<RouteMatch>>,
	location: &Signal<Location>,
	output: Option<Output>,
	hook_error: HookError,
) -> Memo<ContextTree> {
	let reconciler = RefCell::new(reconciler);
	let matches = matches.clone();
	let location = location.clone();
	Memo::new(move || {
		let next = matches.get();
		untrack(|| {
			let href = location.with(Location::href);
			let outcome = reconciler.borrow_mut().reconcile(&next, &href);
			if let Some(output) = &output {
				output.record(&next);
			}
			if let Some(error) = outcome.error {
				let mut pending = hook_error.borrow_mut();
				if pending.is_none() {
					*pending = Some(error);
				}
			}
			outcome.tree
		})
	})
}

/// A nested route resolver driven by a reactive location.
///
/// # Example
///
/// ```
/// use waymark_router::Router;
/// use waymark_routes::RouteDefinition;
///
/// let router = Router::builder()
/// 	.route(
/// 		RouteDefinition::new(":lang")
/// 			.component("Lang")
/// 			.child(RouteDefinition::new("page").component("Page")),
/// 	)
/// 	.initial_path("/en/page")
/// 	.build()
/// 	.unwrap();
///
/// let page = router.tree().leaf().cloned().unwrap();
/// router.set_path("/fr/page").unwrap();
///
/// assert!(router.tree().leaf().unwrap().ptr_eq(&page));
/// assert_eq!(router.params().get("lang"), Some("fr"));
/// ```
pub struct Router {
	config: RouterConfig,
	location: Signal<Location>,
	branches: Signal<Arc<[Branch]>>,
	matches: Memo<Vec<RouteMatch>>,
	params: Memo<Params>,
	states: Memo<ContextTree>,
	owner: Owner,
	root: Option<RouteContent>,
	navigator: Option<Rc<dyn Navigator>>,
	output: Option<Output>,
	hook_error: HookError,
}

impl Router {
	/// Starts building a router.
	pub fn builder() -> RouterBuilder {
		RouterBuilder::default()
	}

	/// Router over `routes` with the default configuration, starting at `/`.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Routes`] for a malformed route tree.
	pub fn new(routes: impl IntoIterator<Item = RouteDefinition>) -> Result<Self, RouterError> {
		Self::builder().routes(routes).build()
	}

	/// The validated configuration.
	pub fn config(&self) -> &RouterConfig {
		&self.config
	}

	/// The current location (tracked).
	pub fn location(&self) -> Location {
		self.location.get()
	}

	/// The current pathname (tracked).
	pub fn pathname(&self) -> String {
		self.location.with(|l| l.pathname.clone())
	}

	/// The compiled branches in rank order.
	pub fn branches(&self) -> Arc<[Branch]> {
		self.branches.get_untracked()
	}

	/// The current match sequence (tracked).
	pub fn matches(&self) -> Vec<RouteMatch> {
		self.matches.get()
	}

	/// Parameters merged over the current match sequence (tracked).
	pub fn params(&self) -> Params {
		self.params.get()
	}

	/// The committed context tree (tracked).
	pub fn tree(&self) -> ContextTree {
		self.states.get()
	}

	/// The root context, or `None` when nothing matches (tracked).
	pub fn root(&self) -> Option<RouteContext> {
		self.states.with(|tree| tree.root().cloned())
	}

	/// Renders the matched chain through `render`, innermost first.
	///
	/// Returns `None` when nothing matches.
	pub fn render<V>(&self, render: &mut dyn FnMut(&RouteContext, Option<V>) -> V) -> Option<V> {
		self.root().map(|root| root.compose(render))
	}

	/// The attached output sink.
	pub fn output(&self) -> Option<&Output> {
		self.output.as_ref()
	}

	/// Takes the pending enter hook failure, if any.
	pub fn take_error(&self) -> Option<RouterError> {
		self.hook_error.borrow_mut().take()
	}

	/// Moves the router to `href` without consulting the navigator.
	///
	/// # Errors
	///
	/// Returns the first enter hook failure of the resulting reconciliation.
	/// The new location and contexts are committed regardless.
	pub fn set_path(&self, href: &str) -> Result<(), RouterError> {
		let next = Location::parse(href);
		if self.location.with_untracked(|current| *current == next) {
			return Ok(());
		}
		self.hook_error.borrow_mut().take();
		batch(|| self.location.set(next));
		self.take_error().map_or(Ok(()), Err)
	}

	/// Navigates to `to`.
	///
	/// Relative targets resolve against the deepest matched route when
	/// `options.resolve` is set, otherwise against the base. The navigator is
	/// consulted first; if it refuses, the location is left unchanged.
	///
	/// # Errors
	///
	/// Returns [`RouterError::ExternalTarget`] for absolute URLs,
	/// [`RouterError::NavigationFailed`] if the navigator refuses, or the first
	/// enter hook failure.
	pub fn navigate(&self, to: &str, options: NavigateOptions) -> Result<(), RouterError> {
		let from = if options.resolve {
			self.states
				.with_untracked(|tree| tree.leaf().map(RouteContext::path_untracked))
		} else {
			None
		};
		let resolved = resolve_path(&self.config.base, to, from.as_deref())
			.ok_or_else(|| RouterError::ExternalTarget(to.to_string()))?;

		let current = self.location.with_untracked(Location::href);
		if resolved == current && options.state.is_none() {
			debug!(to = %resolved, "navigation to current location skipped");
			return Ok(());
		}

		if let Some(navigator) = &self.navigator {
			navigator
				.navigate(&resolved, &options)
				.map_err(|source| RouterError::NavigationFailed {
					path: resolved.clone(),
					source,
				})?;
		}

		debug!(to = %resolved, replace = options.replace, "navigating");
		self.set_path(&resolved)
	}

	/// Navigates to `to`, replacing the current history entry.
	///
	/// # Errors
	///
	/// As [`Router::navigate`].
	pub fn redirect(&self, to: &str) -> Result<(), RouterError> {
		self.navigate(to, NavigateOptions::replace())
	}

	/// Replaces the route tree, rematching the current location.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Routes`] if the new tree is malformed (the old
	/// tree stays active), or the first enter hook failure.
	pub fn set_routes(
		&self,
		routes: impl IntoIterator<Item = RouteDefinition>,
	) -> Result<(), RouterError> {
		let definitions = with_root(routes.into_iter().collect(), self.root.as_ref());
		let branches: Arc<[Branch]> =
			build_branches(&definitions, &self.config.base, &self.config.limits())?.into();

		self.hook_error.borrow_mut().take();
		batch(|| self.branches.set(branches));
		self.take_error().map_or(Ok(()), Err)
	}
}

impl Drop for Router {
	fn drop(&mut self) {
		self.owner.dispose();
	}
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("config", &self.config)
			.field("location", &self.location.with_untracked(Location::href))
			.field("branches", &self.branches.with_untracked(|b| b.len()))
			.field("navigator", &self.navigator.is_some())
			.finish()
	}
}
