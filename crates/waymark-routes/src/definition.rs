//! User-authored route definitions.
//!
//! A [`RouteDefinition`] is one node of the nested route tree: one or more
//! path aliases, optional children, optional content, an optional enter hook
//! and optional match filters. Definitions are cheap to clone and immutable
//! once handed to the branch builder.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use super::filter::{MatchFilter, MatchFilters};
use super::params::Params;

/// Opaque, shareable handle to whatever renders a route.
///
/// The router never inspects content; renderers downcast it back to their
/// own type.
///
/// # Example
///
/// ```
/// use waymark_routes::Content;
///
/// let content = Content::new("users page");
/// assert_eq!(content.downcast_ref::<&str>(), Some(&"users page"));
/// ```
#[derive(Clone)]
pub struct Content(Arc<dyn Any + Send + Sync>);

impl Content {
	/// Wraps a value.
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self(Arc::new(value))
	}

	/// The wrapped value, if it is a `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}

	/// Whether both handles share the same value.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Content {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Content(..)")
	}
}

/// What a route renders.
#[derive(Debug, Clone)]
pub enum RouteContent {
	/// A component invoked with the route's outlet.
	Component(Content),
	/// An already-built element, rendered as is.
	Element(Content),
}

impl RouteContent {
	/// The underlying handle.
	pub fn content(&self) -> &Content {
		match self {
			Self::Component(content) | Self::Element(content) => content,
		}
	}
}

/// Match metadata passed to an enter hook.
#[derive(Debug, Clone, Copy)]
pub struct EnterArgs<'a> {
	/// Parameters merged over the whole matched chain.
	pub params: &'a Params,
	/// Path prefix consumed up to and including this route.
	pub path: &'a str,
	/// Joined pattern of this route.
	pub pattern: &'a str,
	/// The path this route was declared with.
	pub original_path: &'a str,
	/// The full location being entered.
	pub location: &'a str,
}

/// Error returned by an enter hook.
pub type EnterError = Box<dyn Error + Send + Sync>;

/// Hook run when a route becomes part of the matched chain.
pub type OnEnter = Arc<dyn Fn(&EnterArgs<'_>) -> Result<(), EnterError> + Send + Sync>;

#[derive(Clone, Default)]
struct DefinitionData {
	paths: Vec<String>,
	children: Vec<RouteDefinition>,
	content: Option<RouteContent>,
	on_enter: Option<OnEnter>,
	filters: MatchFilters,
	info: Option<serde_json::Value>,
}

/// A node of the nested route tree.
///
/// # Example
///
/// ```
/// use waymark_routes::{MatchFilter, RouteDefinition};
///
/// let routes = RouteDefinition::new("users")
/// 	.component("UsersLayout")
/// 	.child(RouteDefinition::new("").component("UserList"))
/// 	.child(
/// 		RouteDefinition::new(":id")
/// 			.component("UserDetail")
/// 			.filter("id", MatchFilter::pattern(r"^\d+$").unwrap()),
/// 	);
///
/// assert_eq!(routes.children().len(), 2);
/// ```
#[derive(Clone)]
pub struct RouteDefinition {
	inner: Arc<DefinitionData>,
}

impl RouteDefinition {
	/// Definition matching `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self::aliases([path])
	}

	/// Definition matching any of `paths`; all aliases share one identity.
	///
	/// An empty list behaves like a single empty (pathless) path.
	pub fn aliases<I, S>(paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut paths: Vec<String> = paths.into_iter().map(Into::into).collect();
		if paths.is_empty() {
			paths.push(String::new());
		}
		Self {
			inner: Arc::new(DefinitionData {
				paths,
				..DefinitionData::default()
			}),
		}
	}

	/// Pathless definition, typically a layout wrapping its children.
	pub fn layout() -> Self {
		Self::new("")
	}

	fn data_mut(&mut self) -> &mut DefinitionData {
		Arc::make_mut(&mut self.inner)
	}

	/// Appends a child definition.
	pub fn child(mut self, child: RouteDefinition) -> Self {
		self.data_mut().children.push(child);
		self
	}

	/// Appends several child definitions.
	pub fn with_children(mut self, children: impl IntoIterator<Item = RouteDefinition>) -> Self {
		self.data_mut().children.extend(children);
		self
	}

	/// Sets a component as the content.
	pub fn component<T: Any + Send + Sync>(self, component: T) -> Self {
		self.with_content(RouteContent::Component(Content::new(component)))
	}

	/// Sets a prebuilt element as the content.
	pub fn element<T: Any + Send + Sync>(self, element: T) -> Self {
		self.with_content(RouteContent::Element(Content::new(element)))
	}

	/// Sets the content.
	pub fn with_content(mut self, content: RouteContent) -> Self {
		self.data_mut().content = Some(content);
		self
	}

	/// Sets the enter hook.
	pub fn on_enter<F>(mut self, hook: F) -> Self
	where
		F: Fn(&EnterArgs<'_>) -> Result<(), EnterError> + Send + Sync + 'static,
	{
		self.data_mut().on_enter = Some(Arc::new(hook));
		self
	}

	/// Registers a match filter for the parameter `name`.
	pub fn filter(mut self, name: impl Into<String>, filter: impl Into<MatchFilter>) -> Self {
		self.data_mut().filters.insert(name, filter);
		self
	}

	/// Replaces all match filters.
	pub fn with_filters(mut self, filters: MatchFilters) -> Self {
		self.data_mut().filters = filters;
		self
	}

	/// Attaches arbitrary metadata.
	pub fn with_info(mut self, info: serde_json::Value) -> Self {
		self.data_mut().info = Some(info);
		self
	}

	/// Path aliases as written.
	pub fn paths(&self) -> &[String] {
		&self.inner.paths
	}

	/// Child definitions in declaration order.
	pub fn children(&self) -> &[RouteDefinition] {
		&self.inner.children
	}

	/// Content, if any.
	pub fn content(&self) -> Option<&RouteContent> {
		self.inner.content.as_ref()
	}

	/// Enter hook, if any.
	pub fn enter_hook(&self) -> Option<&OnEnter> {
		self.inner.on_enter.as_ref()
	}

	/// Match filters keyed by parameter name.
	pub fn filters(&self) -> &MatchFilters {
		&self.inner.filters
	}

	/// Metadata attached with [`RouteDefinition::with_info`].
	pub fn info(&self) -> Option<&serde_json::Value> {
		self.inner.info.as_ref()
	}

	/// Whether the definition renders anything itself.
	pub fn has_content(&self) -> bool {
		self.inner.content.is_some()
	}

	/// Whether the definition has no children.
	pub fn is_leaf(&self) -> bool {
		self.inner.children.is_empty()
	}

	/// Whether both values are the same definition.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for RouteDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteDefinition")
			.field("paths", &self.inner.paths)
			.field("children", &self.inner.children)
			.field("content", &self.inner.content)
			.field("on_enter", &self.inner.on_enter.is_some())
			.field("filters", &self.inner.filters)
			.finish()
	}
}
