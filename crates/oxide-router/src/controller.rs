//! Controllers and the registry that resolves `Controller@action` strings.
//!
//! A controller is created fresh for every dispatched request by a factory
//! registered under a string key such as `"Blog.Posts"`. Factories are plain
//! closures, so dependencies (a database connection, configuration) are
//! captured when the registry is built instead of looked up globally.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{BoxError, Result, RouterError};
use crate::request::Request;
use crate::response::Response;

/// What a closure handler or a controller action returns.
pub type HandlerResult = std::result::Result<Response, BoxError>;

/// A controller exposing named actions.
///
/// # Example
///
/// ```
/// use futures::FutureExt;
/// use oxide_router::{BoxFuture, Controller, HandlerResult, Request, Response};
///
/// struct Pages;
///
/// impl Controller for Pages {
///     fn actions(&self) -> &[&'static str] {
///         &["show"]
///     }
///
///     fn invoke<'a>(&'a mut self, action: &'a str, request: Request) -> BoxFuture<'a, HandlerResult> {
///         async move {
///             match action {
///                 "show" => Ok(Response::text(format!("page {}", request.param("slug").unwrap_or("home")))),
///                 _ => Err(format!("unknown action {action}").into()),
///             }
///         }
///         .boxed()
///     }
/// }
/// ```
pub trait Controller: Send {
    /// Names of the actions [`Controller::invoke`] answers to.
    fn actions(&self) -> &[&'static str];

    /// Runs before the action. Returning a response skips the action and
    /// the `after` hook.
    fn before<'a>(
        &'a mut self,
        _action: &'a str,
        _request: &'a Request,
    ) -> BoxFuture<'a, Option<Response>> {
        futures::future::ready(None).boxed()
    }

    /// Runs the named action.
    fn invoke<'a>(&'a mut self, action: &'a str, request: Request) -> BoxFuture<'a, HandlerResult>;

    /// Runs after the action and may replace its response.
    fn after(&mut self, _action: &str, response: Response) -> Response {
        response
    }
}

/// Runs `before`, the action, then `after`.
pub async fn call_action(
    controller: &mut dyn Controller,
    action: &str,
    request: Request,
) -> Result<Response> {
    if let Some(response) = controller.before(action, &request).await {
        return Ok(response);
    }

    let response = controller
        .invoke(action, request)
        .await
        .map_err(RouterError::Action)?;

    Ok(controller.after(action, response))
}

/// Splits `"Namespace.Controller@action"` into its controller key and action.
pub fn split_target(target: &str) -> Result<(&str, &str)> {
    match target.trim().split_once('@') {
        Some((controller, action))
            if !controller.is_empty() && !action.is_empty() && !action.contains('@') =>
        {
            Ok((controller, action))
        }
        _ => Err(RouterError::InvalidHandler(String::from(target))),
    }
}

/// Creates a controller instance.
pub type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

/// Maps controller keys to factories.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `key`, replacing any previous one.
    pub fn register<F, C>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.factories.insert(
            key.into(),
            Arc::new(move || Box::new(factory()) as Box<dyn Controller>),
        );
        self
    }

    /// Returns `true` if a factory is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Instantiates the controller registered under `key`.
    pub fn make(&self, key: &str) -> Result<Box<dyn Controller>> {
        self.factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| RouterError::ControllerNotFound(String::from(key)))
    }

    /// Instantiates a controller and checks that it exposes `action`.
    pub fn resolve(&self, controller: &str, action: &str) -> Result<Box<dyn Controller>> {
        let instance = self.make(controller)?;
        if !instance.actions().contains(&action) {
            return Err(RouterError::ActionNotFound {
                controller: String::from(controller),
                action: String::from(action),
            });
        }
        Ok(instance)
    }

    /// Returns the registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("controllers", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Guarded {
        trail: Vec<String>,
    }

    impl Controller for Guarded {
        fn actions(&self) -> &[&'static str] {
            &["open", "secret"]
        }

        fn before<'a>(
            &'a mut self,
            action: &'a str,
            _request: &'a Request,
        ) -> BoxFuture<'a, Option<Response>> {
            async move {
                self.trail.push(format!("before:{action}"));
                (action == "secret").then(|| Response::new(403))
            }
            .boxed()
        }

        fn invoke<'a>(
            &'a mut self,
            action: &'a str,
            _request: Request,
        ) -> BoxFuture<'a, HandlerResult> {
            async move {
                self.trail.push(format!("invoke:{action}"));
                Ok(Response::text("opened"))
            }
            .boxed()
        }

        fn after(&mut self, action: &str, response: Response) -> Response {
            self.trail.push(format!("after:{action}"));
            response.header("X-Action", action)
        }
    }

    #[tokio::test]
    async fn test_call_action_runs_hooks_in_order() {
        let mut controller = Guarded::default();
        let response = call_action(&mut controller, "open", Request::get("/"))
            .await
            .unwrap();

        assert_eq!(response.body_string().as_deref(), Some("opened"));
        assert_eq!(response.headers.get("X-Action").map(String::as_str), Some("open"));
        assert_eq!(controller.trail, ["before:open", "invoke:open", "after:open"]);
    }

    #[tokio::test]
    async fn test_before_hook_short_circuits() {
        let mut controller = Guarded::default();
        let response = call_action(&mut controller, "secret", Request::get("/"))
            .await
            .unwrap();

        assert_eq!(response.status, 403);
        assert_eq!(controller.trail, ["before:secret"]);
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("Blog.Posts@show").unwrap(), ("Blog.Posts", "show"));
        for bad in ["Blog.Posts", "@show", "Blog.Posts@", "A@b@c"] {
            assert!(matches!(
                split_target(bad),
                Err(RouterError::InvalidHandler(_))
            ));
        }
    }

    #[test]
    fn test_registry_resolution() {
        let mut registry = ControllerRegistry::new();
        registry.register("Guarded", Guarded::default);

        assert!(registry.contains("Guarded"));
        assert!(registry.resolve("Guarded", "open").is_ok());
        assert!(matches!(
            registry.resolve("Guarded", "missing"),
            Err(RouterError::ActionNotFound { .. })
        ));
        assert!(matches!(
            registry.resolve("Missing", "open"),
            Err(RouterError::ControllerNotFound(_))
        ));
    }
}
