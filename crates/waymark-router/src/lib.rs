//! # Waymark Router
//!
//! Reactive nested routing on top of [`waymark_routes`] and
//! [`waymark_reactive`].
//!
//! A [`Router`] holds the current location in a signal. Whenever the location
//! or the route tree changes it rematches, then reconciles the matched chain
//! into a tree of [`RouteContext`]s: contexts whose route is still matched at
//! the same depth survive and receive the new match in place; the others are
//! disposed deepest first and replaced.
//!
//! ## Modules
//!
//! - [`router`]: the [`Router`] and its builder
//! - [`reconciler`]: the [`ContextReconciler`] used by the router
//! - [`context`]: live route contexts and the committed tree
//! - [`location`]: path normalization and resolution
//! - [`navigate`]: navigation options and the host [`Navigator`] seam
//! - [`output`]: recording matched chains for server rendering
//! - [`config`]: router configuration, loadable from TOML
//!
//! ## Example
//!
//! ```
//! use waymark_router::Router;
//! use waymark_routes::RouteDefinition;
//!
//! let router = Router::builder()
//! 	.route(
//! 		RouteDefinition::new("users")
//! 			.component("UsersLayout")
//! 			.child(RouteDefinition::new(":id").component("UserDetail")),
//! 	)
//! 	.initial_path("/users/1")
//! 	.build()
//! 	.unwrap();
//!
//! let layout = router.root().unwrap();
//! router.set_path("/users/2").unwrap();
//!
//! // The layout context survived the navigation
//! assert!(router.root().unwrap().ptr_eq(&layout));
//! assert_eq!(router.params().get("id"), Some("2"));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod location;
pub mod navigate;
pub mod output;
pub mod reconciler;
pub mod router;

pub use config::RouterConfig;
pub use context::{ContextTree, RouteContext};
pub use error::{ConfigError, RouterError};
pub use location::Location;
pub use navigate::{NavigateError, NavigateOptions, Navigator};
pub use output::{MatchRecord, Output};
pub use reconciler::{ContextReconciler, Reconciliation};
pub use router::{Router, RouterBuilder};
