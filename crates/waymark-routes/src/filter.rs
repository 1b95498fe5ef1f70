//! Match filters restricting which values a parameter accepts.
//!
//! A filter is attached to a parameter name on a route definition. A parameter
//! with a filter also ranks above an unfiltered parameter at the same position.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

type PredicateFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A constraint on a single parameter value.
#[derive(Clone)]
pub enum MatchFilter {
	/// Accept values for which the predicate returns `true`.
	Predicate(PredicateFn),
	/// Accept one of a fixed set of values.
	///
	/// Compared case-insensitively when the router is case-insensitive.
	OneOf(Vec<String>),
	/// Accept values the regular expression matches.
	///
	/// The expression is not implicitly anchored; use `^...$` to match the
	/// whole value.
	Pattern(Regex),
}

impl MatchFilter {
	/// Filter from a predicate.
	pub fn predicate<F>(f: F) -> Self
	where
		F: Fn(&str) -> bool + Send + Sync + 'static,
	{
		Self::Predicate(Arc::new(f))
	}

	/// Filter from a fixed set of allowed values.
	pub fn one_of<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::OneOf(values.into_iter().map(Into::into).collect())
	}

	/// Filter from a regular expression.
	///
	/// # Errors
	///
	/// Returns the regex compilation error if `pattern` is invalid.
	pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
		Regex::new(pattern).map(Self::Pattern)
	}

	/// Whether `value` passes this filter.
	pub fn accepts(&self, value: &str, case_sensitive: bool) -> bool {
		match self {
			Self::Predicate(f) => f(value),
			Self::OneOf(values) if case_sensitive => values.iter().any(|v| v == value),
			Self::OneOf(values) => {
				let value = value.to_lowercase();
				values.iter().any(|v| v.to_lowercase() == value)
			}
			Self::Pattern(re) => re.is_match(value),
		}
	}
}

impl fmt::Debug for MatchFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Predicate(_) => f.write_str("Predicate(<fn>)"),
			Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
			Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
		}
	}
}

impl From<Regex> for MatchFilter {
	fn from(re: Regex) -> Self {
		Self::Pattern(re)
	}
}

impl From<Vec<String>> for MatchFilter {
	fn from(values: Vec<String>) -> Self {
		Self::OneOf(values)
	}
}

impl From<&[&str]> for MatchFilter {
	fn from(values: &[&str]) -> Self {
		Self::one_of(values.iter().copied())
	}
}

/// Filters keyed by parameter name.
#[derive(Clone, Default)]
pub struct MatchFilters(BTreeMap<String, MatchFilter>);

impl MatchFilters {
	/// Creates an empty filter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the filter for `name`, replacing any previous one.
	pub fn insert(&mut self, name: impl Into<String>, filter: impl Into<MatchFilter>) {
		self.0.insert(name.into(), filter.into());
	}

	/// The filter registered for `name`.
	pub fn get(&self, name: &str) -> Option<&MatchFilter> {
		self.0.get(name)
	}

	/// Whether a filter is registered for `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Whether no filters are registered.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of filtered parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether `value` is acceptable for `name`; unfiltered names accept anything.
	pub fn accepts(&self, name: &str, value: &str, case_sensitive: bool) -> bool {
		self.get(name)
			.is_none_or(|filter| filter.accepts(value, case_sensitive))
	}
}

impl fmt::Debug for MatchFilters {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.0.iter()).finish()
	}
}

impl<K, F> FromIterator<(K, F)> for MatchFilters
where
	K: Into<String>,
	F: Into<MatchFilter>,
{
	fn from_iter<I: IntoIterator<Item = (K, F)>>(iter: I) -> Self {
		let mut filters = Self::new();
		for (name, filter) in iter {
			filters.insert(name, filter);
		}
		filters
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("42", true)]
	#[case("4x", false)]
	#[case("", false)]
	fn test_predicate_filter(#[case] value: &str, #[case] expected: bool) {
		let filter = MatchFilter::predicate(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()));
		assert_eq!(filter.accepts(value, true), expected);
	}

	#[rstest]
	#[case("html", true, true)]
	#[case("HTML", true, false)]
	#[case("HTML", false, true)]
	#[case("pdf", false, false)]
	fn test_one_of_follows_case_mode(
		#[case] value: &str,
		#[case] case_sensitive: bool,
		#[case] expected: bool,
	) {
		let filter = MatchFilter::one_of(["html", "json"]);
		assert_eq!(filter.accepts(value, case_sensitive), expected);
	}

	#[rstest]
	fn test_pattern_filter() {
		let filter = MatchFilter::pattern(r"^\d{4}-\d{2}$").unwrap();

		assert!(filter.accepts("2024-05", true));
		assert!(!filter.accepts("2024-5", true));
	}

	#[rstest]
	fn test_invalid_pattern_is_an_error() {
		assert!(MatchFilter::pattern("(unclosed").is_err());
	}

	#[rstest]
	fn test_filters_accept_unfiltered_names() {
		let filters: MatchFilters = [("id", MatchFilter::one_of(["1"]))].into_iter().collect();

		assert!(filters.accepts("slug", "anything", true));
		assert!(filters.accepts("id", "1", true));
		assert!(!filters.accepts("id", "2", true));
	}
}
