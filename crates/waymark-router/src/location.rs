//! Path utilities: normalization, joining, relative resolution and splitting
//! an href into its parts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trims surrounding slashes and prefixes a single `/`.
///
/// An empty result stays empty when `omit_slash` is set, and a leading `?` or
/// `#` is never prefixed.
fn normalize_segment(path: &str, omit_slash: bool) -> String {
	let trimmed = path.trim_matches('/');
	if trimmed.is_empty() {
		String::new()
	} else if omit_slash || trimmed.starts_with(['?', '#']) {
		trimmed.to_string()
	} else {
		format!("/{trimmed}")
	}
}

/// Normalizes a pathname: one leading slash, no trailing slash, `/` for root.
///
/// ```
/// use waymark_router::location::normalize_path;
///
/// assert_eq!(normalize_path("users/42/"), "/users/42");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
	let normalized = normalize_segment(path, false);
	if normalized.is_empty() {
		"/".to_string()
	} else {
		normalized
	}
}

/// Normalizes a router base: like [`normalize_path`] but the root is `""`.
pub fn normalize_base(base: &str) -> String {
	normalize_segment(base, false)
}

/// Appends `to` to `from`, dropping a trailing wildcard of `from`.
///
/// ```
/// use waymark_router::location::join_paths;
///
/// assert_eq!(join_paths("/admin/*", "users"), "/admin/users");
/// assert_eq!(join_paths("/", "/"), "/");
/// ```
pub fn join_paths(from: &str, to: &str) -> String {
	let from = normalize_segment(from, false);
	let from = match from.find("/*") {
		Some(index) => &from[..index],
		None => from.as_str(),
	};
	let joined = format!("{from}{}", normalize_segment(to, false));
	if joined.is_empty() {
		"/".to_string()
	} else {
		joined
	}
}

/// Whether `path` is an absolute URL (`scheme://...` or `//host`).
pub fn is_external(path: &str) -> bool {
	match path.find("//") {
		Some(0) => true,
		Some(index) => {
			let scheme = &path[..index];
			scheme.len() > 1
				&& scheme.ends_with(':')
				&& scheme[..scheme.len() - 1]
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
		}
		None => false,
	}
}

/// Resolves `path` against `base` and, for relative paths, against `from`.
///
/// Absolute paths (starting with `/`) resolve against `base` only. Returns
/// `None` for absolute URLs, which the router cannot handle.
///
/// ```
/// use waymark_router::location::resolve_path;
///
/// assert_eq!(resolve_path("/app", "settings", Some("/app/users/7")).as_deref(), Some("/app/users/7/settings"));
/// assert_eq!(resolve_path("/app", "/settings", Some("/app/users/7")).as_deref(), Some("/app/settings"));
/// assert_eq!(resolve_path("", "https://example.com", None), None);
/// ```
pub fn resolve_path(base: &str, path: &str, from: Option<&str>) -> Option<String> {
	if is_external(path) {
		return None;
	}

	let base_path = normalize_segment(base, false);
	let from_path = from
		.map(|from| normalize_segment(from, false))
		.filter(|from| !from.is_empty());

	let result = match from_path {
		Some(from_path) if !path.starts_with('/') => {
			if from_path
				.to_lowercase()
				.starts_with(&base_path.to_lowercase())
			{
				from_path
			} else {
				format!("{base_path}{from_path}")
			}
		}
		_ => base_path,
	};

	let tail = normalize_segment(path, result.is_empty());
	let head = if result.is_empty() { "/" } else { result.as_str() };
	Some(format!("{head}{tail}"))
}

/// Returns the pathname part of an href, without `?query` or `#hash`.
pub fn split_path(href: &str) -> &str {
	let end = href.find(['?', '#']).unwrap_or(href.len());
	&href[..end]
}

/// A location split into pathname, query and fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
	/// Normalized pathname.
	pub pathname: String,
	/// Query string including the leading `?`, or empty.
	pub search: String,
	/// Fragment including the leading `#`, or empty.
	pub hash: String,
}

impl Location {
	/// Parses an href such as `/users/7?tab=posts#top`.
	///
	/// ```
	/// use waymark_router::location::Location;
	///
	/// let location = Location::parse("users/7/?tab=posts#top");
	/// assert_eq!(location.pathname, "/users/7");
	/// assert_eq!(location.search, "?tab=posts");
	/// assert_eq!(location.hash, "#top");
	/// ```
	pub fn parse(href: &str) -> Self {
		let (rest, hash) = match href.find('#') {
			Some(index) => href.split_at(index),
			None => (href, ""),
		};
		let (pathname, search) = match rest.find('?') {
			Some(index) => rest.split_at(index),
			None => (rest, ""),
		};
		Self {
			pathname: normalize_path(pathname),
			search: search.to_string(),
			hash: hash.to_string(),
		}
	}

	/// Reassembles the href.
	pub fn href(&self) -> String {
		format!("{}{}{}", self.pathname, self.search, self.hash)
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}{}", self.pathname, self.search, self.hash)
	}
}
