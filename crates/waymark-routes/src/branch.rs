//! Flattening the route tree into ranked branches.
//!
//! [`build_branches`] walks the definition tree depth first and emits one
//! [`Branch`] per alias of every node that can terminate a match: leaves, and
//! nodes with children that also provide content. Branches are then sorted by
//! descending [`Score`]; the sort is stable, so declaration order breaks ties.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::definition::RouteDefinition;
use super::error::{PatternError, RouteError};
use super::filter::MatchFilters;
use super::matcher::{MatchOptions, RouteMatch};
use super::params::Params;
use super::pattern::{PathPattern, PatternLimits, Score};

/// Identity of a route definition in its tree.
///
/// The key pairs the definition's position (child indices leading from the
/// root list) with a signature of the patterns declared along that path. It
/// is stable across rebuilds of an unchanged tree and shared by all aliases
/// of one definition, but a different route declared at the same position
/// gets a different key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
	position: Arc<[usize]>,
	signature: Arc<str>,
}

impl RouteKey {
	/// Key for the given index path and pattern signature.
	pub fn new(position: &[usize], signature: &str) -> Self {
		Self {
			position: position.into(),
			signature: signature.into(),
		}
	}

	/// Child indices from the root list.
	pub fn position(&self) -> &[usize] {
		&self.position
	}

	/// Declared patterns from the root through this definition.
	///
	/// Aliases of one definition appear together, separated by `|`.
	pub fn signature(&self) -> &str {
		&self.signature
	}

	/// Nesting depth, zero for root definitions.
	pub fn depth(&self) -> usize {
		self.position.len().saturating_sub(1)
	}
}

impl fmt::Display for RouteKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, index) in self.position.iter().enumerate() {
			if i > 0 {
				f.write_str(".")?;
			}
			write!(f, "{index}")?;
		}
		Ok(())
	}
}

/// One definition compiled at its position in a branch.
#[derive(Debug, Clone)]
pub struct Route {
	key: RouteKey,
	definition: RouteDefinition,
	original_path: String,
	/// Joined pattern from the root through this route.
	pattern: PathPattern,
	/// Tokens this route consumes itself.
	segment: PathPattern,
}

impl Route {
	/// Identity key shared by every branch through this definition.
	pub fn key(&self) -> &RouteKey {
		&self.key
	}

	/// The source definition.
	pub fn definition(&self) -> &RouteDefinition {
		&self.definition
	}

	/// The alias this route was compiled from, as written.
	pub fn original_path(&self) -> &str {
		&self.original_path
	}

	/// Joined pattern from the root through this route.
	pub fn pattern(&self) -> &PathPattern {
		&self.pattern
	}

	/// The part of the pattern this route consumes.
	pub fn segment(&self) -> &PathPattern {
		&self.segment
	}

	/// Match filters of the source definition.
	pub fn filters(&self) -> &MatchFilters {
		self.definition.filters()
	}
}

/// A ranked root-to-terminal chain of routes.
#[derive(Debug, Clone)]
pub struct Branch {
	routes: Vec<Arc<Route>>,
	score: Score,
	index: usize,
}

impl Branch {
	fn new(routes: Vec<Arc<Route>>, index: usize) -> Self {
		let score = routes
			.last()
			.map(|route| route.pattern.score())
			.unwrap_or_default();
		Self {
			routes,
			score,
			index,
		}
	}

	/// Routes from the root to the terminal route.
	pub fn routes(&self) -> &[Arc<Route>] {
		&self.routes
	}

	/// The full joined pattern.
	pub fn pattern(&self) -> &str {
		self.routes
			.last()
			.map_or("/", |route| route.pattern.as_str())
	}

	/// Specificity score of the full pattern.
	pub fn score(&self) -> &Score {
		&self.score
	}

	/// Position in declaration order before sorting.
	pub fn index(&self) -> usize {
		self.index
	}

	/// Number of routes in the chain.
	pub fn depth(&self) -> usize {
		self.routes.len()
	}

	/// Matches `segments` against the whole chain.
	///
	/// Returns one [`RouteMatch`] per route, or `None` if any route rejects its
	/// segments or segments are left over.
	pub fn match_segments(&self, segments: &[&str], options: &MatchOptions) -> Option<Vec<RouteMatch>> {
		let mut cursor = 0;
		let mut consumed = String::new();
		let mut matches = Vec::with_capacity(self.routes.len());

		for route in &self.routes {
			let (next, params) = route.segment.match_segments(
				segments,
				cursor,
				route.filters(),
				options.case_sensitive,
			)?;
			for segment in &segments[cursor..next] {
				consumed.push('/');
				consumed.push_str(segment);
			}
			cursor = next;
			let path = if consumed.is_empty() {
				"/".to_string()
			} else {
				consumed.clone()
			};
			matches.push(RouteMatch::new(Arc::clone(route), path, params));
		}

		(cursor == segments.len()).then_some(matches)
	}

	/// Builds a concrete path for this branch from `params`.
	pub fn reverse(&self, params: &Params) -> Option<String> {
		self.routes.last()?.pattern.reverse(params)
	}
}

/// Compiles a route tree into branches sorted by descending specificity.
///
/// `base` is prepended to every root definition.
///
/// # Errors
///
/// Returns [`RouteError::InvalidPattern`] for the first malformed path found,
/// including combinations that are only invalid once joined with an ancestor.
///
/// # Example
///
/// ```
/// use waymark_routes::{RouteDefinition, build_branches, PatternLimits};
///
/// let routes = vec![
/// 	RouteDefinition::new("users/:id").component("UserDetail"),
/// 	RouteDefinition::new("users/new").component("NewUser"),
/// ];
/// let branches = build_branches(&routes, "", &PatternLimits::default()).unwrap();
///
/// assert_eq!(branches[0].pattern(), "/users/new");
/// assert_eq!(branches[1].pattern(), "/users/:id");
/// ```
pub fn build_branches(
	definitions: &[RouteDefinition],
	base: &str,
	limits: &PatternLimits,
) -> Result<Vec<Branch>, RouteError> {
	let base_pattern = PathPattern::compile(base, &MatchFilters::default(), limits)
		.map_err(|source| invalid(base, source))?;

	let mut builder = Builder {
		limits,
		position: Vec::new(),
		stack: Vec::new(),
		branches: Vec::new(),
	};
	builder.collect(definitions, &PathPattern::default(), "", Some(&base_pattern))?;

	let mut branches = builder.branches;
	branches.sort_by(|a, b| b.score.cmp(&a.score));

	debug!(count = branches.len(), base, "route branches built");
	Ok(branches)
}

struct Builder<'a> {
	limits: &'a PatternLimits,
	position: Vec<usize>,
	stack: Vec<Arc<Route>>,
	branches: Vec<Branch>,
}

impl Builder<'_> {
	fn collect(
		&mut self,
		definitions: &[RouteDefinition],
		parent: &PathPattern,
		parent_signature: &str,
		prefix: Option<&PathPattern>,
	) -> Result<(), RouteError> {
		for (index, definition) in definitions.iter().enumerate() {
			self.position.push(index);

			let compiled = definition
				.paths()
				.iter()
				.map(|alias| {
					PathPattern::compile(alias, definition.filters(), self.limits)
						.map(|own| (alias, own))
						.map_err(|source| invalid(alias, source))
				})
				.collect::<Result<Vec<_>, _>>()?;
			let key = RouteKey::new(&self.position, &signature(parent_signature, &compiled));

			if definition.is_leaf() && !definition.has_content() {
				warn!(route = %key, paths = ?definition.paths(), "route has neither content nor children");
			}

			for (alias, own) in compiled {
				let own = match prefix {
					Some(prefix) => self.join(prefix, &own)?,
					None => own,
				};

				if definition.is_leaf() {
					self.emit(&key, definition, alias, parent, own)?;
					continue;
				}

				let layout_segment = own.without_wildcard();
				let layout_pattern = self.join(parent, &layout_segment)?;
				self.stack.push(Arc::new(Route {
					key: key.clone(),
					definition: definition.clone(),
					original_path: alias.clone(),
					pattern: layout_pattern.clone(),
					segment: layout_segment,
				}));
				let children = self.collect(
					definition.children(),
					&layout_pattern,
					key.signature(),
					None,
				);
				self.stack.pop();
				children?;

				if definition.has_content() {
					self.emit(&key, definition, alias, parent, own)?;
				}
			}

			self.position.pop();
		}
		Ok(())
	}

	fn emit(
		&mut self,
		key: &RouteKey,
		definition: &RouteDefinition,
		alias: &str,
		parent: &PathPattern,
		segment: PathPattern,
	) -> Result<(), RouteError> {
		let pattern = self.join(parent, &segment)?;
		let mut routes = self.stack.clone();
		routes.push(Arc::new(Route {
			key: key.clone(),
			definition: definition.clone(),
			original_path: alias.to_string(),
			pattern,
			segment,
		}));
		let index = self.branches.len();
		self.branches.push(Branch::new(routes, index));
		Ok(())
	}

	fn join(&self, parent: &PathPattern, child: &PathPattern) -> Result<PathPattern, RouteError> {
		parent.join(child, self.limits).map_err(|source| {
			invalid(&format!("{}{}", parent.as_str().trim_end_matches('/'), child.as_str()), source)
		})
	}
}

/// Appends the declared patterns of one definition to its parent's signature.
fn signature(parent: &str, compiled: &[(&String, PathPattern)]) -> String {
	let own: Vec<&str> = compiled.iter().map(|(_, pattern)| pattern.as_str()).collect();
	match own.as_slice() {
		[single] => format!("{}{single}", parent.trim_end_matches('/')),
		_ => format!("{}({})", parent.trim_end_matches('/'), own.join("|")),
	}
}

fn invalid(path: &str, source: PatternError) -> RouteError {
	RouteError::InvalidPattern {
		path: path.to_string(),
		source,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn build(routes: &[RouteDefinition]) -> Vec<Branch> {
		build_branches(routes, "", &PatternLimits::default()).unwrap()
	}

	fn patterns(branches: &[Branch]) -> Vec<&str> {
		branches.iter().map(Branch::pattern).collect()
	}

	#[rstest]
	fn test_leaf_per_alias() {
		let routes = vec![RouteDefinition::aliases(["about", "about-us"]).component("About")];

		let branches = build(&routes);

		assert_eq!(branches.len(), 2);
		assert_eq!(branches[0].routes()[0].key(), branches[1].routes()[0].key());
		assert_eq!(branches[0].routes()[0].original_path(), "about");
		assert_eq!(branches[1].routes()[0].original_path(), "about-us");
	}

	#[rstest]
	fn test_layout_without_content_is_not_terminal() {
		let routes = vec![
			RouteDefinition::new("users")
				.child(RouteDefinition::new(":id").component("UserDetail")),
		];

		let branches = build(&routes);

		assert_eq!(patterns(&branches), vec!["/users/:id"]);
		assert_eq!(branches[0].depth(), 2);
	}

	#[rstest]
	fn test_layout_with_content_emits_terminal_after_children() {
		// Arrange
		let routes = vec![
			RouteDefinition::new("users")
				.component("UsersLayout")
				.child(RouteDefinition::new("").component("UserList")),
		];

		// Act
		let branches = build(&routes);

		// Assert
		assert_eq!(patterns(&branches), vec!["/users", "/users"]);
		assert_eq!(branches[0].depth(), 2);
		assert_eq!(branches[1].depth(), 1);
	}

	#[rstest]
	fn test_non_leaf_wildcard_dropped_for_children() {
		let routes = vec![
			RouteDefinition::new("admin/*")
				.component("AdminLayout")
				.child(RouteDefinition::new("settings").component("Settings")),
		];

		let branches = build(&routes);

		assert_eq!(patterns(&branches), vec!["/admin/settings", "/admin/*"]);
		assert_eq!(branches[0].routes()[0].pattern().as_str(), "/admin");
	}

	#[rstest]
	fn test_base_prefixes_root_routes() {
		let routes = vec![RouteDefinition::new("users").child(RouteDefinition::new(":id").component("U"))];

		let branches = build_branches(&routes, "/app", &PatternLimits::default()).unwrap();

		assert_eq!(branches[0].pattern(), "/app/users/:id");
		assert_eq!(branches[0].routes()[0].segment().as_str(), "/app/users");
		assert_eq!(branches[0].routes()[1].segment().as_str(), "/:id");
	}

	#[rstest]
	fn test_keys_follow_tree_position() {
		let routes = vec![
			RouteDefinition::new("a").component("A"),
			RouteDefinition::new("b")
				.child(RouteDefinition::new("x").component("X"))
				.child(RouteDefinition::new("y").component("Y")),
		];

		let branches = build(&routes);
		let keys: Vec<String> = branches
			.iter()
			.map(|b| b.routes().last().unwrap().key().to_string())
			.collect();

		assert_eq!(keys, vec!["1.0", "1.1", "0"]);
	}

	#[rstest]
	fn test_key_signature_follows_declared_patterns() {
		let routes = vec![
			RouteDefinition::new(":lang")
				.child(RouteDefinition::aliases(["page", "p"]).component("Page")),
		];

		let branches = build(&routes);
		let leaf = branches[0].routes().last().unwrap().key();

		assert_eq!(branches[0].routes()[0].key().signature(), "/:lang");
		assert_eq!(leaf.signature(), "/:lang(/page|/p)");
		assert_eq!(leaf, branches[1].routes().last().unwrap().key());
	}

	#[rstest]
	#[case::same_pattern(":slug", true)]
	#[case::other_pattern("about", false)]
	fn test_key_at_same_position(#[case] replacement: &str, #[case] same: bool) {
		// Arrange
		let before = build(&[RouteDefinition::new(":slug").component("Slug")]);
		let after = build(&[RouteDefinition::new(replacement).component("Other")]);

		// Act
		let old_key = before[0].routes()[0].key();
		let new_key = after[0].routes()[0].key();

		// Assert
		assert_eq!(old_key.position(), new_key.position());
		assert_eq!(old_key == new_key, same);
	}

	#[rstest]
	fn test_invalid_child_pattern_is_reported() {
		let routes = vec![RouteDefinition::new("users").child(RouteDefinition::new("*rest/x"))];

		let err = build_branches(&routes, "", &PatternLimits::default()).unwrap_err();

		assert_eq!(
			err,
			RouteError::InvalidPattern {
				path: "*rest/x".into(),
				source: PatternError::MisplacedWildcard {
					pattern: "/*rest/x".into(),
					segment: "*rest".into(),
				},
			}
		);
	}

	#[rstest]
	fn test_optional_parent_with_children_is_rejected() {
		let routes = vec![
			RouteDefinition::new(":lang?")
				.child(RouteDefinition::new("about").component("About")),
		];

		let err = build_branches(&routes, "", &PatternLimits::default()).unwrap_err();

		assert!(matches!(
			err,
			RouteError::InvalidPattern {
				source: PatternError::NonTrailingOptional { .. },
				..
			}
		));
	}

	#[rstest]
	fn test_stable_sort_keeps_declaration_order() {
		let routes = vec![
			RouteDefinition::new(":a").component("A"),
			RouteDefinition::new(":b").component("B"),
		];

		let branches = build(&routes);

		assert_eq!(patterns(&branches), vec!["/:a", "/:b"]);
		assert_eq!(branches[0].index(), 0);
	}

	#[rstest]
	fn test_match_segments_groups_by_route() {
		let routes = vec![
			RouteDefinition::new("users/:id")
				.child(RouteDefinition::new("posts/:post").component("Post")),
		];
		let branches = build(&routes);

		let matches = branches[0]
			.match_segments(&["users", "7", "posts", "3"], &MatchOptions::default())
			.unwrap();

		assert_eq!(matches.len(), 2);
		assert_eq!(matches[0].path(), "/users/7");
		assert_eq!(matches[0].params().get("id"), Some("7"));
		assert_eq!(matches[1].path(), "/users/7/posts/3");
		assert_eq!(matches[1].params().get("post"), Some("3"));
		assert_eq!(matches[1].params().get("id"), None);
	}

	#[rstest]
	fn test_branch_reverse() {
		let routes = vec![RouteDefinition::new("users").child(RouteDefinition::new(":id").component("U"))];
		let branches = build(&routes);
		let params: Params = [("id", "9")].into_iter().collect();

		assert_eq!(branches[0].reverse(&params), Some("/users/9".to_string()));
	}
}
