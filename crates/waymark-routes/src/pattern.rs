//! Path pattern compilation and specificity scoring.
//!
//! Patterns are `/`-separated segments:
//!
//! - `users` - a literal segment
//! - `:id` - a named parameter capturing one segment
//! - `:id?` or `edit?` - an optional trailing segment
//! - `*` or `*rest` - a wildcard capturing the remainder of the path
//!
//! Leading, trailing and repeated slashes are insignificant, so `users/:id`,
//! `/users/:id/` and `//users//:id` compile to the same pattern.
//!
//! # Ranking
//!
//! Every compiled pattern carries a [`Score`]: one [`SegmentWeight`] per
//! segment followed by an end marker. Scores compare lexicographically, so the
//! first differing depth decides which pattern is more specific.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::PatternError;
use super::filter::MatchFilters;
use super::params::Params;

/// Maximum allowed length for a route pattern string in bytes.
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of segments in a route pattern.
pub const MAX_PATTERN_SEGMENTS: usize = 32;

/// Parameter name used by a wildcard written without a name (`*`).
pub const DEFAULT_WILDCARD_NAME: &str = "*";

/// Size limits applied when compiling patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternLimits {
	/// Maximum pattern length in bytes.
	pub max_length: usize,
	/// Maximum number of segments.
	pub max_segments: usize,
}

impl Default for PatternLimits {
	fn default() -> Self {
		Self {
			max_length: MAX_PATTERN_LENGTH,
			max_segments: MAX_PATTERN_SEGMENTS,
		}
	}
}

impl PatternLimits {
	fn check(&self, pattern: &str, segments: usize) -> Result<(), PatternError> {
		if pattern.len() > self.max_length {
			return Err(PatternError::TooLong {
				length: pattern.len(),
				max: self.max_length,
			});
		}
		if segments > self.max_segments {
			return Err(PatternError::TooManySegments {
				count: segments,
				max: self.max_segments,
			});
		}
		Ok(())
	}
}

/// Specificity weight of one pattern segment.
///
/// The discriminants are the per-segment weights (literal 4, parameter 3,
/// optional 2, wildcard 0) doubled. The odd slots hold the filtered-parameter
/// tie-break and the end-of-pattern marker, which ranks a pattern that ends
/// here above one continuing with an optional or wildcard segment.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentWeight {
	/// `*` / `*name`
	Wildcard = 0,
	/// `:name?` / `literal?`
	Optional = 4,
	/// End of pattern.
	End = 5,
	/// `:name`
	Param = 6,
	/// `:name` with a registered match filter
	FilteredParam = 7,
	/// Literal segment
	Static = 8,
}

impl SegmentWeight {
	/// Numeric value used in comparisons.
	pub fn value(self) -> u8 {
		self as u8
	}
}

/// Comparable specificity of a compiled pattern; higher is more specific.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Score(Vec<SegmentWeight>);

impl Score {
	/// Per-depth weights, ending with [`SegmentWeight::End`].
	pub fn weights(&self) -> &[SegmentWeight] {
		&self.0
	}
}

impl fmt::Display for Score {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[")?;
		for (i, weight) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{}", weight.value())?;
		}
		f.write_str("]")
	}
}

/// One compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternToken {
	/// Literal segment.
	Static(String),
	/// Named parameter consuming exactly one segment.
	Param {
		/// Parameter name.
		name: String,
		/// Whether a match filter is registered for the name.
		filtered: bool,
	},
	/// Literal segment that may be absent.
	OptionalStatic(String),
	/// Named parameter that may be absent.
	OptionalParam {
		/// Parameter name.
		name: String,
		/// Whether a match filter is registered for the name.
		filtered: bool,
	},
	/// Catch-all for the rest of the path.
	Wildcard {
		/// Parameter name the remainder is bound to.
		name: String,
	},
}

impl PatternToken {
	/// Specificity weight of this token.
	pub fn weight(&self) -> SegmentWeight {
		match self {
			Self::Static(_) => SegmentWeight::Static,
			Self::Param { filtered: true, .. } => SegmentWeight::FilteredParam,
			Self::Param { filtered: false, .. } => SegmentWeight::Param,
			Self::OptionalStatic(_) | Self::OptionalParam { .. } => SegmentWeight::Optional,
			Self::Wildcard { .. } => SegmentWeight::Wildcard,
		}
	}

	/// Parameter name bound by this token, if any.
	pub fn param_name(&self) -> Option<&str> {
		match self {
			Self::Param { name, .. } | Self::OptionalParam { name, .. } | Self::Wildcard { name } => {
				Some(name)
			}
			Self::Static(_) | Self::OptionalStatic(_) => None,
		}
	}

	/// Whether the token may match zero segments.
	pub fn is_optional(&self) -> bool {
		matches!(
			self,
			Self::OptionalStatic(_) | Self::OptionalParam { .. } | Self::Wildcard { .. }
		)
	}

	fn parse(segment: &str, pattern: &str, filters: &MatchFilters) -> Result<Self, PatternError> {
		let empty_name = || PatternError::EmptyName {
			pattern: pattern.to_string(),
			segment: segment.to_string(),
		};

		if let Some(name) = segment.strip_prefix('*') {
			let name = if name.is_empty() { DEFAULT_WILDCARD_NAME } else { name };
			return Ok(Self::Wildcard {
				name: name.to_string(),
			});
		}

		if let Some(name) = segment.strip_prefix(':') {
			let (name, optional) = match name.strip_suffix('?') {
				Some(name) => (name, true),
				None => (name, false),
			};
			if name.is_empty() {
				return Err(empty_name());
			}
			let filtered = filters.contains(name);
			let name = name.to_string();
			return Ok(if optional {
				Self::OptionalParam { name, filtered }
			} else {
				Self::Param { name, filtered }
			});
		}

		match segment.strip_suffix('?') {
			Some("") => Err(empty_name()),
			Some(literal) => Ok(Self::OptionalStatic(literal.to_string())),
			None => Ok(Self::Static(segment.to_string())),
		}
	}
}

impl fmt::Display for PatternToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Static(literal) => f.write_str(literal),
			Self::Param { name, .. } => write!(f, ":{name}"),
			Self::OptionalStatic(literal) => write!(f, "{literal}?"),
			Self::OptionalParam { name, .. } => write!(f, ":{name}?"),
			Self::Wildcard { name } if name == DEFAULT_WILDCARD_NAME => f.write_str("*"),
			Self::Wildcard { name } => write!(f, "*{name}"),
		}
	}
}

/// A compiled route pattern.
///
/// # Example
///
/// ```
/// use waymark_routes::PathPattern;
///
/// let pattern = PathPattern::new("users/:id/*rest").unwrap();
/// assert_eq!(pattern.as_str(), "/users/:id/*rest");
///
/// let params = pattern.matches("/users/7/posts/3").unwrap();
/// assert_eq!(params.get("id"), Some("7"));
/// assert_eq!(params.get("rest"), Some("posts/3"));
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
	/// Normalized pattern string.
	pattern: String,
	tokens: Vec<PatternToken>,
}

impl PathPattern {
	/// Compiles `pattern` with no match filters and the default limits.
	///
	/// # Errors
	///
	/// Returns a [`PatternError`] if the pattern is malformed.
	pub fn new(pattern: &str) -> Result<Self, PatternError> {
		Self::compile(pattern, &MatchFilters::default(), &PatternLimits::default())
	}

	/// Compiles `pattern`, marking parameters that have a filter in `filters`.
	///
	/// # Errors
	///
	/// Returns a [`PatternError`] if the pattern exceeds `limits`, if a wildcard
	/// or optional segment is not last, if a name is empty, or if a parameter
	/// name is repeated.
	pub fn compile(
		pattern: &str,
		filters: &MatchFilters,
		limits: &PatternLimits,
	) -> Result<Self, PatternError> {
		let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
		limits.check(pattern, segments.len())?;

		let normalized = render(segments.iter().copied());
		let tokens = segments
			.iter()
			.map(|segment| PatternToken::parse(segment, &normalized, filters))
			.collect::<Result<Vec<_>, _>>()?;

		let mut seen = HashSet::new();
		for name in tokens.iter().filter_map(PatternToken::param_name) {
			if !seen.insert(name) {
				return Err(PatternError::DuplicateParameter {
					pattern: normalized.clone(),
					name: name.to_string(),
				});
			}
		}

		Self::from_tokens(tokens)
	}

	fn from_tokens(tokens: Vec<PatternToken>) -> Result<Self, PatternError> {
		let pattern = render(tokens.iter());
		let last = tokens.len().saturating_sub(1);
		for (i, token) in tokens.iter().enumerate() {
			if i == last {
				break;
			}
			match token {
				PatternToken::Wildcard { .. } => {
					return Err(PatternError::MisplacedWildcard {
						pattern,
						segment: token.to_string(),
					});
				}
				PatternToken::OptionalStatic(_) | PatternToken::OptionalParam { .. } => {
					return Err(PatternError::NonTrailingOptional {
						pattern,
						segment: token.to_string(),
					});
				}
				_ => {}
			}
		}
		Ok(Self { pattern, tokens })
	}

	/// Appends `child` to this pattern.
	///
	/// Parameter names may repeat across the two halves; the later binding wins
	/// when parameters are merged.
	///
	/// # Errors
	///
	/// Fails if this pattern ends in a wildcard or optional segment and `child`
	/// is not empty, or if the joined pattern exceeds `limits`.
	pub fn join(&self, child: &PathPattern, limits: &PatternLimits) -> Result<Self, PatternError> {
		if child.tokens.is_empty() {
			return Ok(self.clone());
		}
		if self.tokens.is_empty() {
			return Ok(child.clone());
		}
		let tokens: Vec<PatternToken> = self.tokens.iter().chain(&child.tokens).cloned().collect();
		let joined = Self::from_tokens(tokens)?;
		limits.check(&joined.pattern, joined.tokens.len())?;
		Ok(joined)
	}

	/// This pattern with a trailing wildcard removed.
	pub fn without_wildcard(&self) -> Self {
		match self.tokens.last() {
			Some(PatternToken::Wildcard { .. }) => {
				let tokens = self.tokens[..self.tokens.len() - 1].to_vec();
				Self {
					pattern: render(tokens.iter()),
					tokens,
				}
			}
			_ => self.clone(),
		}
	}

	/// Normalized pattern string, always starting with `/`.
	pub fn as_str(&self) -> &str {
		&self.pattern
	}

	/// Compiled tokens in path order.
	pub fn tokens(&self) -> &[PatternToken] {
		&self.tokens
	}

	/// Parameter names in path order.
	pub fn param_names(&self) -> Vec<&str> {
		self.tokens.iter().filter_map(PatternToken::param_name).collect()
	}

	/// Whether the pattern consumes no segments.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Whether the pattern has only literal segments.
	pub fn is_exact(&self) -> bool {
		self.tokens.iter().all(|t| matches!(t, PatternToken::Static(_)))
	}

	/// Whether the pattern ends in a wildcard.
	pub fn has_wildcard(&self) -> bool {
		matches!(self.tokens.last(), Some(PatternToken::Wildcard { .. }))
	}

	/// Specificity score of this pattern.
	pub fn score(&self) -> Score {
		let mut weights: Vec<SegmentWeight> = self.tokens.iter().map(PatternToken::weight).collect();
		weights.push(SegmentWeight::End);
		Score(weights)
	}

	/// Matches the whole of `path` against this pattern, case-sensitively and
	/// without filters.
	pub fn matches(&self, path: &str) -> Option<Params> {
		let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
		let (consumed, params) =
			self.match_segments(&segments, 0, &MatchFilters::default(), true)?;
		(consumed == segments.len()).then_some(params)
	}

	/// Matches the tokens against `segments` starting at `start`.
	///
	/// Returns the index after the last consumed segment and the bound
	/// parameters, or `None` if a token rejects its segment.
	pub(crate) fn match_segments(
		&self,
		segments: &[&str],
		start: usize,
		filters: &MatchFilters,
		case_sensitive: bool,
	) -> Option<(usize, Params)> {
		let mut cursor = start;
		let mut params = Params::new();

		for token in &self.tokens {
			match token {
				PatternToken::Static(literal) => {
					let segment = segments.get(cursor)?;
					if !literal_eq(literal, segment, case_sensitive) {
						return None;
					}
					cursor += 1;
				}
				PatternToken::Param { name, .. } => {
					let segment = segments.get(cursor)?;
					if !filters.accepts(name, segment, case_sensitive) {
						return None;
					}
					params.insert(name.as_str(), *segment);
					cursor += 1;
				}
				PatternToken::OptionalStatic(literal) => {
					if let Some(segment) = segments.get(cursor) {
						if !literal_eq(literal, segment, case_sensitive) {
							return None;
						}
						cursor += 1;
					}
				}
				PatternToken::OptionalParam { name, .. } => {
					if let Some(segment) = segments.get(cursor) {
						if !filters.accepts(name, segment, case_sensitive) {
							return None;
						}
						params.insert(name.as_str(), *segment);
						cursor += 1;
					}
				}
				PatternToken::Wildcard { name } => {
					let rest = segments.get(cursor..).unwrap_or_default().join("/");
					if !filters.accepts(name, &rest, case_sensitive) {
						return None;
					}
					params.insert(name.as_str(), rest);
					cursor = segments.len();
				}
			}
		}

		Some((cursor, params))
	}

	/// Builds a concrete path from this pattern.
	///
	/// Returns `None` if a required parameter is missing. Optional literals are
	/// left out; optional parameters and wildcards are filled in when present.
	///
	/// # Example
	///
	/// ```
	/// use waymark_routes::{Params, PathPattern};
	///
	/// let pattern = PathPattern::new("users/:id/tab?").unwrap();
	/// let params: Params = [("id", "42")].into_iter().collect();
	/// assert_eq!(pattern.reverse(&params), Some("/users/42".to_string()));
	/// ```
	pub fn reverse(&self, params: &Params) -> Option<String> {
		let mut path = String::new();
		for token in &self.tokens {
			let segment = match token {
				PatternToken::Static(literal) => literal.as_str(),
				PatternToken::Param { name, .. } => params.get(name)?,
				PatternToken::OptionalStatic(_) => continue,
				PatternToken::OptionalParam { name, .. } | PatternToken::Wildcard { name } => {
					match params.get(name) {
						Some(value) if !value.is_empty() => value,
						_ => continue,
					}
				}
			};
			path.push('/');
			path.push_str(segment.trim_matches('/'));
		}
		if path.is_empty() {
			path.push('/');
		}
		Some(path)
	}
}

fn literal_eq(literal: &str, segment: &str, case_sensitive: bool) -> bool {
	if case_sensitive {
		literal == segment
	} else {
		literal.to_lowercase() == segment.to_lowercase()
	}
}

fn render<T: fmt::Display>(segments: impl Iterator<Item = T>) -> String {
	let mut out = String::new();
	for segment in segments {
		out.push('/');
		out.push_str(&segment.to_string());
	}
	if out.is_empty() {
		out.push('/');
	}
	out
}

impl Default for PathPattern {
	fn default() -> Self {
		Self {
			pattern: "/".to_string(),
			tokens: Vec::new(),
		}
	}
}

impl PartialEq for PathPattern {
	fn eq(&self, other: &Self) -> bool {
		self.tokens == other.tokens
	}
}

impl Eq for PathPattern {}

impl fmt::Display for PathPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.pattern)
	}
}
