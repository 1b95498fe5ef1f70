//! # Waymark Routes
//!
//! Route pattern compilation, branch ranking and path matching.
//!
//! The pipeline has three stages, all pure and `Send + Sync`:
//!
//! 1. [`PathPattern`] compiles one pattern into tokens and a [`Score`].
//! 2. [`build_branches`] flattens a tree of [`RouteDefinition`]s into
//!    [`Branch`]es sorted by descending score.
//! 3. [`match_path`] returns the [`RouteMatch`] chain of the first branch
//!    matching a pathname.
//!
//! ## Example
//!
//! ```
//! use waymark_routes::{MatchOptions, PatternLimits, RouteDefinition, build_branches, match_path, merge_params};
//!
//! let routes = vec![
//! 	RouteDefinition::new("users")
//! 		.component("UsersLayout")
//! 		.child(RouteDefinition::new(":id").component("UserDetail")),
//! ];
//! let branches = build_branches(&routes, "", &PatternLimits::default()).unwrap();
//!
//! let matches = match_path(&branches, "/users/42", &MatchOptions::default());
//! assert_eq!(matches.len(), 2);
//! assert_eq!(merge_params(&matches).get("id"), Some("42"));
//! ```

#![warn(missing_docs)]

pub mod branch;
pub mod definition;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod params;
pub mod pattern;

pub use branch::{Branch, Route, RouteKey, build_branches};
pub use definition::{Content, EnterArgs, EnterError, OnEnter, RouteContent, RouteDefinition};
pub use error::{ParamError, PatternError, RouteError};
pub use filter::{MatchFilter, MatchFilters};
pub use matcher::{MatchOptions, RouteMatch, match_path, merge_params, split_segments};
pub use params::{FromParams, Params};
pub use pattern::{
	DEFAULT_WILDCARD_NAME, MAX_PATTERN_LENGTH, MAX_PATTERN_SEGMENTS, PathPattern, PatternLimits,
	PatternToken, Score, SegmentWeight,
};
