//! Matched path parameters and typed access to them.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ParamError;

/// Parameter names and captured values.
///
/// Values are stored exactly as captured from the path, and iteration order is
/// by name so that two sets of parameters compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the raw value of `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Returns whether `name` was captured.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Inserts a value, returning the one it replaced.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.0.insert(name.into(), value.into())
	}

	/// Copies every entry of `other` into `self`; `other` wins on conflicts.
	pub fn merge(&mut self, other: &Params) {
		for (name, value) in &other.0 {
			self.0.insert(name.clone(), value.clone());
		}
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether there are no parameters.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates `(name, value)` pairs ordered by name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Returns the value of `name`, failing if it was not captured.
	///
	/// # Errors
	///
	/// Returns [`ParamError::Missing`] if no such parameter exists.
	pub fn require(&self, name: &str) -> Result<&str, ParamError> {
		self.get(name)
			.ok_or_else(|| ParamError::Missing(name.to_string()))
	}

	/// Parses the value of `name` into `T`.
	///
	/// # Errors
	///
	/// Returns [`ParamError::Missing`] if the parameter was not captured and
	/// [`ParamError::Parse`] if `T::from_str` rejects the raw value.
	///
	/// # Example
	///
	/// ```
	/// use waymark_routes::Params;
	///
	/// let params: Params = [("id", "42")].into_iter().collect();
	/// let id: u32 = params.parse("id").unwrap();
	/// assert_eq!(id, 42);
	/// ```
	pub fn parse<T>(&self, name: &str) -> Result<T, ParamError>
	where
		T: FromStr,
		T::Err: fmt::Display,
	{
		let raw = self.require(name)?;
		raw.parse::<T>().map_err(|e| ParamError::Parse {
			name: name.to_string(),
			raw_value: raw.to_string(),
			param_type: std::any::type_name::<T>(),
			message: e.to_string(),
		})
	}

	/// Parses an optional parameter, returning `Ok(None)` when it is absent.
	///
	/// # Errors
	///
	/// Returns [`ParamError::Parse`] if the value exists but cannot be parsed.
	pub fn parse_optional<T>(&self, name: &str) -> Result<Option<T>, ParamError>
	where
		T: FromStr,
		T::Err: fmt::Display,
	{
		if self.contains(name) {
			self.parse(name).map(Some)
		} else {
			Ok(None)
		}
	}

	/// Extracts a typed value implementing [`FromParams`].
	///
	/// # Errors
	///
	/// Propagates the error returned by [`FromParams::from_params`].
	pub fn extract<T: FromParams>(&self) -> Result<T, ParamError> {
		T::from_params(self)
	}

	/// Consumes the set, returning the underlying map.
	pub fn into_inner(self) -> BTreeMap<String, String> {
		self.0
	}
}

impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl IntoIterator for Params {
	type Item = (String, String);
	type IntoIter = btree_map::IntoIter<String, String>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl From<BTreeMap<String, String>> for Params {
	fn from(map: BTreeMap<String, String>) -> Self {
		Self(map)
	}
}

/// Types that can be built from matched path parameters.
///
/// # Example
///
/// ```
/// use waymark_routes::{FromParams, ParamError, Params};
///
/// struct PostRef {
/// 	user: String,
/// 	post: u64,
/// }
///
/// impl FromParams for PostRef {
/// 	fn from_params(params: &Params) -> Result<Self, ParamError> {
/// 		Ok(Self {
/// 			user: params.require("user")?.to_string(),
/// 			post: params.parse("post")?,
/// 		})
/// 	}
/// }
///
/// let params: Params = [("user", "ada"), ("post", "7")].into_iter().collect();
/// let post: PostRef = params.extract().unwrap();
/// assert_eq!(post.post, 7);
/// ```
pub trait FromParams: Sized {
	/// Builds `Self` from the parameter set.
	///
	/// # Errors
	///
	/// Returns a [`ParamError`] when a required parameter is missing or malformed.
	fn from_params(params: &Params) -> Result<Self, ParamError>;
}

impl FromParams for Params {
	fn from_params(params: &Params) -> Result<Self, ParamError> {
		Ok(params.clone())
	}
}

impl FromParams for BTreeMap<String, String> {
	fn from_params(params: &Params) -> Result<Self, ParamError> {
		Ok(params.0.clone())
	}
}
