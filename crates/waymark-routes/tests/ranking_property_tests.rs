//! Property-based tests for pattern ranking and matching
//!
//! Uses proptest to verify:
//! 1. Segment kinds are ordered literal > parameter > optional > wildcard at every depth
//! 2. Branch sorting is stable for equal scores
//! 3. Matching is idempotent

use proptest::prelude::*;
use waymark_routes::{
	MatchOptions, PathPattern, PatternLimits, RouteDefinition, build_branches, match_path,
};

fn segment() -> impl Strategy<Value = String> {
	"[a-z]{1,8}"
}

fn prefix() -> impl Strategy<Value = Vec<String>> {
	prop::collection::vec(segment(), 0..6)
}

fn score_of(prefix: &[String], last: &str) -> waymark_routes::Score {
	let mut parts = prefix.to_vec();
	parts.push(last.to_string());
	PathPattern::new(&parts.join("/")).unwrap().score()
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	/// Property: at the same depth, literal > param > optional > wildcard
	#[test]
	fn test_segment_kind_ordering(prefix in prefix(), literal in segment(), tail in prefix()) {
		let literal_with_tail = {
			let mut parts = vec![literal.clone()];
			parts.extend(tail.iter().cloned());
			parts.join("/")
		};
		let param_with_tail = {
			let mut parts = vec![":p".to_string()];
			parts.extend(tail.iter().cloned());
			parts.join("/")
		};

		let literal_score = score_of(&prefix, &literal_with_tail);
		let param_score = score_of(&prefix, &param_with_tail);
		let optional_score = score_of(&prefix, ":p?");
		let wildcard_score = score_of(&prefix, "*rest");

		// Later segments never overturn the first differing depth
		prop_assert!(literal_score > param_score);
		prop_assert!(score_of(&prefix, ":p") > optional_score);
		prop_assert!(optional_score > wildcard_score);
	}

	/// Property: equal scores keep declaration order
	#[test]
	fn test_sort_is_stable(prefix in prefix(), count in 2usize..8) {
		let routes: Vec<RouteDefinition> = (0..count)
			.map(|i| {
				let mut parts = prefix.clone();
				parts.push(format!(":p{i}"));
				RouteDefinition::new(parts.join("/")).component(i)
			})
			.collect();

		let branches = build_branches(&routes, "", &PatternLimits::default()).unwrap();
		let order: Vec<usize> = branches.iter().map(|b| b.index()).collect();

		prop_assert_eq!(order, (0..count).collect::<Vec<_>>());
	}

	/// Property: matching twice yields identical sequences
	#[test]
	fn test_matching_is_idempotent(segments in prop::collection::vec(segment(), 0..5)) {
		let routes = vec![
			RouteDefinition::new(":a").component("A").child(RouteDefinition::new(":b").component("B")),
			RouteDefinition::new("fixed/*rest").component("Rest"),
			RouteDefinition::new("/").component("Home"),
		];
		let branches = build_branches(&routes, "", &PatternLimits::default()).unwrap();
		let path = format!("/{}", segments.join("/"));

		let first = match_path(&branches, &path, &MatchOptions::default());
		let second = match_path(&branches, &path, &MatchOptions::default());

		prop_assert_eq!(&first, &second);
		let first_keys: Vec<_> = first.iter().map(|m| m.key().clone()).collect();
		let second_keys: Vec<_> = second.iter().map(|m| m.key().clone()).collect();
		prop_assert_eq!(first_keys, second_keys);
	}
}
