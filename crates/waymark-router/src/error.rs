//! Router error types.

use std::path::PathBuf;

use waymark_routes::{EnterError, RouteError};

use super::navigate::NavigateError;

/// Error type for router operations.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
	/// The route tree could not be compiled.
	#[error(transparent)]
	Routes(#[from] RouteError),
	/// An enter hook failed. The context tree was still committed.
	#[error("Enter hook for route '{route}' failed: {source}")]
	EnterHook {
		/// Original path of the route whose hook failed.
		route: String,
		/// Error returned by the hook.
		#[source]
		source: EnterError,
	},
	/// The navigation target cannot be handled by the router.
	#[error("Cannot navigate to '{0}': not a path within this router")]
	ExternalTarget(String),
	/// The integrator's navigator refused the navigation.
	#[error("Navigation to '{path}' failed: {source}")]
	NavigationFailed {
		/// Resolved target path.
		path: String,
		/// Error returned by the navigator.
		#[source]
		source: NavigateError,
	},
	/// Invalid configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Error loading or validating a [`RouterConfig`](crate::RouterConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The config file could not be read.
	#[error("Failed to read router config '{}': {source}", path.display())]
	Io {
		/// Path that was read.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},
	/// The TOML document is malformed or has wrongly typed fields.
	#[error("Failed to parse router config: {0}")]
	Parse(#[from] toml::de::Error),
	/// A field has an unusable value.
	#[error("Invalid router config field '{field}': {message}")]
	Invalid {
		/// Field name.
		field: &'static str,
		/// What is wrong with it.
		message: String,
	},
}
