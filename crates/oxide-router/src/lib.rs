//! # oxide-router
//!
//! Pattern-based URL routing with closure and controller handlers.
//!
//! This crate provides:
//! - Path templates compiled to anchored, case-insensitive regexes
//! - Optional and constrained placeholders
//! - Per-method route tables with first-match dispatch
//! - Controllers resolved from `"Namespace.Controller@action"` strings,
//!   with `before`/`after` hooks around every action
//!
//! ## Path Templates
//!
//! ```text
//! /users/{id}             required, matches [^/]+
//! /users/{id:num}         digits only
//! /files/{path:all}       rest of the path, slashes included
//! /pages/{slug?}          optional, matches /pages and /pages/about
//! /{lang:[a-z]{2}}/about  inline regex
//! ```
//!
//! Constraints can also be set per route with [`Router::register_with`] or
//! for every route with [`Router::set_constraint`]. An inline modifier wins
//! over a route constraint, which wins over a global one.
//!
//! ## Controllers
//!
//! ```ignore
//! let mut controllers = ControllerRegistry::new();
//! controllers.register("Blog.Posts", move || PostsController::new(db.clone()));
//!
//! let mut router = Router::with_controllers(controllers);
//! router.action(&["GET"], "/posts/{id:num}", "Blog.Posts@show")?;
//!
//! let response = router.handle("GET", "/posts/42").await?;
//! ```
//!
//! Unknown controllers and actions are rejected when the route is
//! registered, not when it is first requested.

mod controller;
mod error;
mod path;
mod request;
mod response;
mod router;

pub use controller::{
    call_action, split_target, BoxFuture, Controller, ControllerFactory, ControllerRegistry,
    HandlerResult,
};
pub use error::{BoxError, Result, RouterError};
pub use path::{Constraints, PathPattern};
pub use request::{Method, PathParams, Request};
pub use response::Response;
pub use router::{Handler, HandlerFn, Route, Router};
