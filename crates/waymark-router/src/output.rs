//! Recording matched chains for server-side rendering.
//!
//! A server renders a page once and needs to know which routes it rendered
//! (to preload data, pick status codes, or hydrate the client). Attach an
//! [`Output`] to the router and every committed match sequence is appended to
//! it as a list of [`MatchRecord`]s.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use waymark_routes::{Params, RouteMatch};

/// Serializable summary of one matched depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
	/// The alias the route was declared with.
	pub original_path: String,
	/// Joined pattern of the route.
	pub pattern: String,
	/// Path prefix consumed up to this depth.
	pub path: String,
	/// Parameters bound at this depth.
	pub params: Params,
}

impl From<&RouteMatch> for MatchRecord {
	fn from(route_match: &RouteMatch) -> Self {
		Self {
			original_path: route_match.original_path().to_string(),
			pattern: route_match.pattern().to_string(),
			path: route_match.path().to_string(),
			params: route_match.params().clone(),
		}
	}
}

/// Shared sink of recorded match sequences.
#[derive(Debug, Clone, Default)]
pub struct Output {
	matches: Rc<RefCell<Vec<Vec<MatchRecord>>>>,
}

impl Output {
	/// Creates an empty sink.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends one match sequence.
	pub fn record(&self, matches: &[RouteMatch]) {
		let records = matches.iter().map(MatchRecord::from).collect();
		self.matches.borrow_mut().push(records);
	}

	/// All recorded sequences, oldest first.
	pub fn matches(&self) -> Vec<Vec<MatchRecord>> {
		self.matches.borrow().clone()
	}

	/// The most recent sequence.
	pub fn last(&self) -> Option<Vec<MatchRecord>> {
		self.matches.borrow().last().cloned()
	}

	/// Number of recorded sequences.
	pub fn len(&self) -> usize {
		self.matches.borrow().len()
	}

	/// Whether nothing has been recorded.
	pub fn is_empty(&self) -> bool {
		self.matches.borrow().is_empty()
	}

	/// Drops every recorded sequence.
	pub fn clear(&self) {
		self.matches.borrow_mut().clear();
	}

	/// Serializes the recorded sequences as a JSON array of arrays.
	///
	/// # Errors
	///
	/// Returns the serializer error; recorded values are plain strings, so this
	/// does not fail in practice.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(&*self.matches.borrow())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use waymark_routes::{MatchOptions, PatternLimits, RouteDefinition, build_branches, match_path};

	#[rstest]
	fn test_record_and_serialize() {
		// Arrange
		let routes = vec![
			RouteDefinition::new("users")
				.child(RouteDefinition::aliases([":id", "me"]).component("User")),
		];
		let branches = build_branches(&routes, "", &PatternLimits::default()).unwrap();
		let output = Output::new();

		// Act
		output.record(&match_path(&branches, "/users/7", &MatchOptions::default()));
		output.record(&match_path(&branches, "/nowhere", &MatchOptions::default()));

		// Assert
		assert_eq!(output.len(), 2);
		assert_eq!(output.last(), Some(Vec::new()));
		let first = &output.matches()[0];
		assert_eq!(first[1].original_path, ":id");
		assert_eq!(first[1].pattern, "/users/:id");
		assert_eq!(first[1].params.get("id"), Some("7"));

		let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
		assert_eq!(json[0][0]["path"], "/users");
		assert_eq!(json[0][1]["params"]["id"], "7");
	}

	#[rstest]
	fn test_clones_share_records() {
		let output = Output::new();
		let handle = output.clone();

		handle.record(&[]);
		output.clear();

		assert!(handle.is_empty());
	}
}
