//! Navigation contract between the router and its host.
//!
//! The router owns no history. An integrator supplies a [`Navigator`] that
//! pushes or replaces entries in whatever history the host has (browser
//! history, a test log, nothing on the server); the router updates its own
//! location after the navigator accepts.

use std::error::Error;

use serde::{Deserialize, Serialize};

/// Error returned by a [`Navigator`].
pub type NavigateError = Box<dyn Error + Send + Sync>;

/// Options for [`Router::navigate`](crate::Router::navigate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigateOptions {
	/// Replace the current history entry instead of pushing a new one.
	pub replace: bool,
	/// Scroll to the top after navigating.
	pub scroll: bool,
	/// Opaque state stored with the history entry.
	pub state: Option<serde_json::Value>,
	/// Resolve relative targets against the deepest matched route.
	pub resolve: bool,
}

impl Default for NavigateOptions {
	fn default() -> Self {
		Self {
			replace: false,
			scroll: true,
			state: None,
			resolve: true,
		}
	}
}

impl NavigateOptions {
	/// Options for a history-replacing navigation.
	pub fn replace() -> Self {
		Self {
			replace: true,
			..Self::default()
		}
	}

	/// Sets the history state.
	pub fn with_state(mut self, state: serde_json::Value) -> Self {
		self.state = Some(state);
		self
	}

	/// Sets whether to scroll to the top.
	pub fn with_scroll(mut self, scroll: bool) -> Self {
		self.scroll = scroll;
		self
	}

	/// Sets whether relative targets resolve against the current route.
	pub fn with_resolve(mut self, resolve: bool) -> Self {
		self.resolve = resolve;
		self
	}
}

/// Host-side navigation.
///
/// Implemented for any `Fn(&str, &NavigateOptions) -> Result<(), NavigateError>`.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use waymark_router::{NavigateError, NavigateOptions, Navigator};
///
/// let history = Rc::new(RefCell::new(Vec::new()));
/// let navigator = {
/// 	let history = history.clone();
/// 	move |to: &str, _: &NavigateOptions| -> Result<(), NavigateError> {
/// 		history.borrow_mut().push(to.to_string());
/// 		Ok(())
/// 	}
/// };
///
/// navigator.navigate("/users", &NavigateOptions::default()).unwrap();
/// assert_eq!(*history.borrow(), vec!["/users".to_string()]);
/// ```
pub trait Navigator {
	/// Commits a navigation to `to`, already resolved against the router base.
	///
	/// # Errors
	///
	/// Returning an error aborts the navigation; the router location is left
	/// unchanged.
	fn navigate(&self, to: &str, options: &NavigateOptions) -> Result<(), NavigateError>;
}

impl<F> Navigator for F
where
	F: Fn(&str, &NavigateOptions) -> Result<(), NavigateError>,
{
	fn navigate(&self, to: &str, options: &NavigateOptions) -> Result<(), NavigateError> {
		self(to, options)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let options = NavigateOptions::default();

		assert!(!options.replace);
		assert!(options.scroll);
		assert!(options.resolve);
		assert!(options.state.is_none());
	}

	#[rstest]
	fn test_replace_keeps_other_defaults() {
		let options = NavigateOptions::replace().with_state(serde_json::json!({ "from": "login" }));

		assert!(options.replace);
		assert!(options.scroll);
		assert_eq!(options.state.unwrap()["from"], "login");
	}

	#[rstest]
	fn test_deserialize_partial_options() {
		let options: NavigateOptions = serde_json::from_str(r#"{"replace": true}"#).unwrap();

		assert!(options.replace);
		assert!(options.resolve);
	}

	#[rstest]
	fn test_closure_navigator_can_refuse() {
		let navigator = |to: &str, _: &NavigateOptions| -> Result<(), NavigateError> {
			Err(format!("blocked: {to}").into())
		};

		let err = navigator.navigate("/admin", &NavigateOptions::default()).unwrap_err();

		assert_eq!(err.to_string(), "blocked: /admin");
	}
}
