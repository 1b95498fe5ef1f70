//! # Waymark
//!
//! Nested route resolution with reactive route contexts.
//!
//! Waymark turns a tree of route definitions into ranked branches, matches a
//! pathname against them, and keeps one live [`RouteContext`] per matched
//! depth. When the path changes, contexts whose route is still matched at the
//! same depth are kept and receive the new parameters in place; the rest are
//! disposed and rebuilt.
//!
//! ## Crates
//!
//! - [`reactive`] (`waymark-reactive`): signals, memos, effects and disposal
//!   scopes
//! - [`routes`] (`waymark-routes`): pattern compilation, branch ranking and
//!   matching, with no reactive dependencies
//! - [`router`] (`waymark-router`): the reactive [`Router`] and its context
//!   reconciler
//!
//! ## Quick Start
//!
//! ```
//! use waymark::prelude::*;
//!
//! let router = Router::builder()
//! 	.route(
//! 		RouteDefinition::new("users")
//! 			.component("UsersLayout")
//! 			.child(RouteDefinition::new(":id").component("UserDetail"))
//! 			.child(RouteDefinition::new("new").component("NewUser")),
//! 	)
//! 	.initial_path("/users/new")
//! 	.build()
//! 	.unwrap();
//!
//! // The literal child outranks the parameter
//! assert_eq!(router.tree().leaf().unwrap().pattern(), "/users/new");
//!
//! router.set_path("/users/42").unwrap();
//! assert_eq!(router.params().get("id"), Some("42"));
//! ```

pub use waymark_reactive as reactive;
pub use waymark_router as router;
pub use waymark_routes as routes;

pub use waymark_router::{
	ContextReconciler, ContextTree, NavigateOptions, Navigator, RouteContext, Router,
	RouterBuilder, RouterConfig, RouterError,
};
pub use waymark_routes::{
	Branch, MatchFilter, MatchOptions, Params, PathPattern, RouteContent, RouteDefinition,
	RouteError, RouteKey, RouteMatch, build_branches, match_path, merge_params,
};

/// Commonly used types.
pub mod prelude {
	pub use waymark_reactive::{Effect, Memo, Owner, Signal, batch, on_cleanup, untrack};
	pub use waymark_router::{
		NavigateOptions, Navigator, Output, RouteContext, Router, RouterConfig, RouterError,
	};
	pub use waymark_routes::{
		EnterArgs, EnterError, MatchFilter, Params, RouteContent, RouteDefinition, RouteMatch,
	};
}
