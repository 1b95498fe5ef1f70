//! Matching a pathname against ranked branches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::branch::{Branch, Route, RouteKey};
use super::params::Params;

/// Options affecting how paths are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
	/// Compare literal segments case-sensitively (the default).
	///
	/// Parameter values are always captured verbatim.
	pub case_sensitive: bool,
}

impl Default for MatchOptions {
	fn default() -> Self {
		Self {
			case_sensitive: true,
		}
	}
}

/// One depth of a matched chain.
///
/// Holds only the parameters bound at this depth; see [`merge_params`] for the
/// combined view.
///
/// Two matches are equal when they bind the same path and parameters to the
/// same definition at the same position, even across branch rebuilds.
#[derive(Debug, Clone)]
pub struct RouteMatch {
	route: Arc<Route>,
	path: String,
	params: Params,
}

impl RouteMatch {
	pub(crate) fn new(route: Arc<Route>, path: String, params: Params) -> Self {
		Self {
			route,
			path,
			params,
		}
	}

	/// The matched route.
	pub fn route(&self) -> &Arc<Route> {
		&self.route
	}

	/// Identity key of the matched route.
	pub fn key(&self) -> &RouteKey {
		self.route.key()
	}

	/// Path prefix consumed up to and including this depth.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Parameters bound at this depth.
	pub fn params(&self) -> &Params {
		&self.params
	}

	/// Joined pattern of the matched route.
	pub fn pattern(&self) -> &str {
		self.route.pattern().as_str()
	}

	/// The alias the route was declared with.
	pub fn original_path(&self) -> &str {
		self.route.original_path()
	}
}

impl PartialEq for RouteMatch {
	fn eq(&self, other: &Self) -> bool {
		self.route.key() == other.route.key()
			&& self.route.pattern() == other.route.pattern()
			&& self.route.definition().ptr_eq(other.route.definition())
			&& self.path == other.path
			&& self.params == other.params
	}
}

impl Eq for RouteMatch {}

/// Splits a pathname into its non-empty segments.
pub fn split_segments(path: &str) -> Vec<&str> {
	path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Finds the first branch matching `path`.
///
/// Returns one [`RouteMatch`] per route of the winning branch, or an empty
/// vector when nothing matches.
///
/// # Example
///
/// ```
/// use waymark_routes::{MatchOptions, PatternLimits, RouteDefinition, build_branches, match_path};
///
/// let routes = vec![
/// 	RouteDefinition::new("users/:id").component("UserDetail"),
/// 	RouteDefinition::new("users/new").component("NewUser"),
/// ];
/// let branches = build_branches(&routes, "", &PatternLimits::default()).unwrap();
///
/// let matches = match_path(&branches, "/users/new", &MatchOptions::default());
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].pattern(), "/users/new");
/// assert!(matches[0].params().is_empty());
///
/// assert!(match_path(&branches, "/nowhere", &MatchOptions::default()).is_empty());
/// ```
pub fn match_path(branches: &[Branch], path: &str, options: &MatchOptions) -> Vec<RouteMatch> {
	let segments = split_segments(path);
	for branch in branches {
		match branch.match_segments(&segments, options) {
			Some(matches) => {
				trace!(path, branch = branch.pattern(), "branch matched");
				return matches;
			}
			None => trace!(path, branch = branch.pattern(), "branch rejected"),
		}
	}
	Vec::new()
}

/// Merges per-depth parameters, deeper depths overriding shallower ones.
pub fn merge_params(matches: &[RouteMatch]) -> Params {
	let mut merged = Params::new();
	for m in matches {
		merged.merge(&m.params);
	}
	merged
}
