//! Error types for route compilation and parameter access.

/// A path pattern that cannot be compiled.
///
/// Raised when the route tree is built, never while matching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
	/// A wildcard segment is followed by further segments.
	#[error("Wildcard segment '{segment}' must be the last segment of '{pattern}'")]
	MisplacedWildcard {
		/// The full pattern.
		pattern: String,
		/// The offending segment.
		segment: String,
	},
	/// An optional segment is followed by further segments.
	#[error("Optional segment '{segment}' must be the last segment of '{pattern}'")]
	NonTrailingOptional {
		/// The full pattern.
		pattern: String,
		/// The offending segment.
		segment: String,
	},
	/// A parameter or optional marker without a name.
	#[error("Segment '{segment}' in '{pattern}' has an empty name")]
	EmptyName {
		/// The full pattern.
		pattern: String,
		/// The offending segment.
		segment: String,
	},
	/// The same parameter name is bound twice by one pattern.
	#[error("Parameter '{name}' appears more than once in '{pattern}'")]
	DuplicateParameter {
		/// The full pattern.
		pattern: String,
		/// The repeated name.
		name: String,
	},
	/// Pattern string is longer than the configured limit.
	#[error("Pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Actual length in bytes.
		length: usize,
		/// Configured limit.
		max: usize,
	},
	/// Pattern has more segments than the configured limit.
	#[error("Pattern has {count} path segments, exceeding maximum of {max}")]
	TooManySegments {
		/// Actual segment count.
		count: usize,
		/// Configured limit.
		max: usize,
	},
}

/// Error building branches from a route definition tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
	/// A definition's path (or its combination with its ancestors) is malformed.
	#[error("Invalid route path '{path}': {source}")]
	InvalidPattern {
		/// The path as written (or as joined with its ancestors).
		path: String,
		/// Underlying pattern error.
		#[source]
		source: PatternError,
	},
}

/// Error reading a path parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
	/// No parameter with this name was matched.
	#[error("Missing parameter: {0}")]
	Missing(String),
	/// The raw value could not be parsed into the requested type.
	#[error("Failed to parse parameter '{name}' value '{raw_value}' as {param_type}: {message}")]
	Parse {
		/// Parameter name.
		name: String,
		/// Raw captured value.
		raw_value: String,
		/// Requested type name.
		param_type: &'static str,
		/// Parser error message.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_pattern_error_display() {
		let err = PatternError::MisplacedWildcard {
			pattern: "/files/*rest/edit".to_string(),
			segment: "*rest".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"Wildcard segment '*rest' must be the last segment of '/files/*rest/edit'"
		);
	}

	#[rstest]
	fn test_route_error_wraps_source() {
		use std::error::Error;

		let err = RouteError::InvalidPattern {
			path: ":id?/edit".to_string(),
			source: PatternError::NonTrailingOptional {
				pattern: "/:id?/edit".to_string(),
				segment: ":id?".to_string(),
			},
		};

		assert!(err.to_string().starts_with("Invalid route path ':id?/edit'"));
		assert!(err.source().is_some());
	}

	#[rstest]
	fn test_param_error_display() {
		let err = ParamError::Parse {
			name: "id".to_string(),
			raw_value: "abc".to_string(),
			param_type: "u32",
			message: "invalid digit found in string".to_string(),
		};
		assert!(err.to_string().contains("'abc'"));
		assert!(err.to_string().contains("u32"));
		assert_eq!(ParamError::Missing("id".into()).to_string(), "Missing parameter: id");
	}
}
