//! Router configuration.
//!
//! ```toml
//! base = "/app"
//! case_sensitive = false
//! max_pattern_length = 512
//! max_segments = 16
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use waymark_routes::{MAX_PATTERN_LENGTH, MAX_PATTERN_SEGMENTS, MatchOptions, PatternLimits};

use super::error::ConfigError;
use super::location::normalize_base;

/// Router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
	/// Path prefix prepended to every root route.
	pub base: String,
	/// Compare literal segments case-sensitively.
	pub case_sensitive: bool,
	/// Maximum length of a route pattern in bytes.
	pub max_pattern_length: usize,
	/// Maximum number of segments in a joined route pattern.
	pub max_segments: usize,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			base: String::new(),
			case_sensitive: true,
			max_pattern_length: MAX_PATTERN_LENGTH,
			max_segments: MAX_PATTERN_SEGMENTS,
		}
	}
}

impl RouterConfig {
	/// Sets the base path.
	pub fn with_base(mut self, base: impl Into<String>) -> Self {
		self.base = base.into();
		self
	}

	/// Sets case sensitivity of literal segments.
	pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
		self.case_sensitive = case_sensitive;
		self
	}

	/// Sets the pattern size limits.
	pub fn with_limits(mut self, limits: PatternLimits) -> Self {
		self.max_pattern_length = limits.max_length;
		self.max_segments = limits.max_segments;
		self
	}

	/// Parses and validates a TOML document.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Parse`] for malformed TOML and
	/// [`ConfigError::Invalid`] for unusable values.
	///
	/// # Example
	///
	/// ```
	/// use waymark_router::RouterConfig;
	///
	/// let config = RouterConfig::from_toml_str("base = \"app/\"\ncase_sensitive = false").unwrap();
	/// assert_eq!(config.base, "/app");
	/// assert!(!config.case_sensitive);
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()
	}

	/// Reads, parses and validates a TOML file.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
	/// [`RouterConfig::from_toml_str`].
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&source)
	}

	/// Checks limits and normalizes `base`.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Invalid`] if a limit is zero or the base contains
	/// a query, fragment or pattern syntax.
	pub fn validate(mut self) -> Result<Self, ConfigError> {
		if self.max_pattern_length == 0 {
			return Err(ConfigError::Invalid {
				field: "max_pattern_length",
				message: "must be greater than zero".to_string(),
			});
		}
		if self.max_segments == 0 {
			return Err(ConfigError::Invalid {
				field: "max_segments",
				message: "must be greater than zero".to_string(),
			});
		}
		if let Some(c) = self.base.chars().find(|c| matches!(c, '?' | '#' | ':' | '*')) {
			return Err(ConfigError::Invalid {
				field: "base",
				message: format!("must be a plain path, found '{c}'"),
			});
		}
		self.base = normalize_base(&self.base);
		Ok(self)
	}

	/// Options used when matching paths.
	pub fn match_options(&self) -> MatchOptions {
		MatchOptions {
			case_sensitive: self.case_sensitive,
		}
	}

	/// Limits used when compiling patterns.
	pub fn limits(&self) -> PatternLimits {
		PatternLimits {
			max_length: self.max_pattern_length,
			max_segments: self.max_segments,
		}
	}
}
