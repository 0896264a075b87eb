//! Route tables and dispatch.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, trace, warn};

use crate::controller::{call_action, split_target, BoxFuture, ControllerRegistry, HandlerResult};
use crate::error::{Result, RouterError};
use crate::path::{Constraints, PathPattern};
use crate::request::{Method, PathParams, Request};
use crate::response::Response;

/// A boxed async closure handler.
pub type HandlerFn = Arc<dyn Fn(Request) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// The target a route dispatches to.
#[derive(Clone)]
pub enum Handler {
    /// An async closure receiving the request with its parameters.
    Closure(HandlerFn),
    /// A controller key and action name, resolved through the registry.
    Action { controller: String, action: String },
}

impl Handler {
    /// Wraps an async closure.
    pub fn closure<F, Fut>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Closure(Arc::new(move |req| handler(req).boxed()))
    }

    /// Parses a `"Namespace.Controller@action"` string.
    pub fn action(target: &str) -> Result<Self> {
        let (controller, action) = split_target(target)?;
        Ok(Self::Action {
            controller: String::from(controller),
            action: String::from(action),
        })
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(_) => f.write_str("Closure"),
            Self::Action { controller, action } => write!(f, "{controller}@{action}"),
        }
    }
}

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: PathPattern,
    constraints: Constraints,
    handler: Handler,
}

impl Route {
    /// Returns the normalized template.
    #[must_use]
    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    /// Returns the compiled pattern.
    #[must_use]
    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the handler.
    #[must_use]
    pub const fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Per-method route tables with first-match dispatch.
///
/// # Example
///
/// ```
/// use oxide_router::{Request, Response, Router};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut router = Router::new();
/// router
///     .get("/hello/{name?}", |req: Request| async move {
///         let name = req.param("name").unwrap_or("world");
///         Ok(Response::text(format!("Hello, {name}!")))
///     })
///     .unwrap();
///
/// let res = router.dispatch(Request::get("/hello/ferris")).await.unwrap();
/// assert_eq!(res.body_string().as_deref(), Some("Hello, ferris!"));
///
/// let res = router.dispatch(Request::get("/hello")).await.unwrap();
/// assert_eq!(res.body_string().as_deref(), Some("Hello, world!"));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
    constraints: Constraints,
    controllers: ControllerRegistry,
}

impl Router {
    /// Creates a router without controllers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router resolving action strings through `controllers`.
    #[must_use]
    pub fn with_controllers(controllers: ControllerRegistry) -> Self {
        Self {
            controllers,
            ..Self::default()
        }
    }

    /// Returns the controller registry.
    #[must_use]
    pub const fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Registers a handler for the given methods.
    ///
    /// Method names are case-insensitive and GET implies HEAD. Registering
    /// an existing template again replaces its handler without changing
    /// its match priority.
    pub fn register(&mut self, methods: &[&str], template: &str, handler: Handler) -> Result<&mut Self> {
        self.register_with(methods, template, handler, &[])
    }

    /// Registers a handler with per-route placeholder constraints.
    pub fn register_with(
        &mut self,
        methods: &[&str],
        template: &str,
        handler: Handler,
        constraints: &[(&str, &str)],
    ) -> Result<&mut Self> {
        let constraints: Constraints = constraints
            .iter()
            .map(|(name, regex)| (String::from(*name), String::from(*regex)))
            .collect();
        let pattern = PathPattern::compile(template, &constraints, &self.constraints)?;

        if let Handler::Action { controller, action } = &handler {
            self.controllers.resolve(controller, action)?;
        }

        let mut verbs: Vec<Method> = Vec::new();
        for name in methods {
            match Method::parse(name) {
                Some(method) => verbs.push(method),
                None => warn!(method = %name, template = %pattern.template(), "Skipping unknown method"),
            }
        }
        if verbs.contains(&Method::Get) {
            verbs.push(Method::Head);
        }
        verbs.sort_unstable();
        verbs.dedup();

        let route = Route {
            pattern,
            constraints,
            handler,
        };

        for method in verbs {
            trace!(%method, template = %route.template(), handler = ?route.handler, "Registering route");
            let table = self.routes.entry(method).or_default();
            match table.iter_mut().find(|r| r.template() == route.template()) {
                Some(existing) => *existing = route.clone(),
                None => table.push(route.clone()),
            }
        }

        Ok(self)
    }

    /// Sets a global placeholder constraint and recompiles every route.
    pub fn set_constraint(&mut self, name: &str, regex: &str) -> Result<&mut Self> {
        let mut global = self.constraints.clone();
        global.insert(String::from(name), String::from(regex));

        let mut rebuilt = HashMap::with_capacity(self.routes.len());
        for (method, table) in &self.routes {
            let mut routes = Vec::with_capacity(table.len());
            for route in table {
                let pattern = PathPattern::compile(route.template(), &route.constraints, &global)?;
                routes.push(Route {
                    pattern,
                    ..route.clone()
                });
            }
            rebuilt.insert(*method, routes);
        }

        self.constraints = global;
        self.routes = rebuilt;
        Ok(self)
    }

    /// Registers a GET (and HEAD) closure route.
    pub fn get<F, Fut>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(&["GET"], template, Handler::closure(handler))
    }

    /// Registers a POST closure route.
    pub fn post<F, Fut>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(&["POST"], template, Handler::closure(handler))
    }

    /// Registers a PUT closure route.
    pub fn put<F, Fut>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(&["PUT"], template, Handler::closure(handler))
    }

    /// Registers a PATCH closure route.
    pub fn patch<F, Fut>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(&["PATCH"], template, Handler::closure(handler))
    }

    /// Registers a DELETE closure route.
    pub fn delete<F, Fut>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(&["DELETE"], template, Handler::closure(handler))
    }

    /// Registers an OPTIONS closure route.
    pub fn options<F, Fut>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(&["OPTIONS"], template, Handler::closure(handler))
    }

    /// Registers a closure for GET, POST, PUT, DELETE, PATCH and HEAD.
    pub fn any<F, Fut>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let methods: Vec<&str> = Method::ANY.iter().map(|m| m.as_str()).collect();
        self.register(&methods, template, Handler::closure(handler))
    }

    /// Registers a `"Controller@action"` target for the given methods.
    ///
    /// The controller and action are checked against the registry now,
    /// not at the first request.
    pub fn action(&mut self, methods: &[&str], template: &str, target: &str) -> Result<&mut Self> {
        self.register(methods, template, Handler::action(target)?)
    }

    /// Returns the templates registered for `method`, in match order.
    #[must_use]
    pub fn routes(&self, method: Method) -> Vec<&str> {
        self.routes
            .get(&method)
            .map(|table| table.iter().map(Route::template).collect())
            .unwrap_or_default()
    }

    /// Builds a path for a registered template.
    ///
    /// Returns `None` if no route uses the template or a required
    /// parameter is missing.
    #[must_use]
    pub fn url(&self, template: &str, params: &PathParams) -> Option<String> {
        let template = PathPattern::normalize(template);
        self.routes
            .values()
            .flatten()
            .find(|route| route.template() == template)?
            .pattern
            .reverse(params)
    }

    /// Finds the first route matching the request.
    pub fn find(&self, method: Method, path: &str) -> Option<(&Route, PathParams)> {
        let path = if path.is_empty() { "/" } else { path };
        self.routes
            .get(&method)?
            .iter()
            .find_map(|route| route.pattern.match_path(path).map(|params| (route, params)))
    }

    /// Dispatches a request to the first matching route.
    pub async fn dispatch(&self, mut request: Request) -> Result<Response> {
        if request.path.is_empty() {
            request.path = String::from("/");
        }

        let Some((route, params)) = self.find(request.method, &request.path) else {
            return Err(RouterError::NotFound {
                method: request.method.to_string(),
                path: request.path,
            });
        };

        debug!(
            method = %request.method,
            path = %request.path,
            route = %route.template(),
            handler = ?route.handler,
            "Matched route"
        );
        request.params = params;

        match &route.handler {
            Handler::Closure(handler) => handler(request).await.map_err(RouterError::Action),
            Handler::Action { controller, action } => {
                let mut instance = self.controllers.resolve(controller, action)?;
                call_action(instance.as_mut(), action, request).await
            }
        }
    }

    /// Dispatches a method name and request target such as `/posts?page=2`.
    ///
    /// An unknown method is reported as [`RouterError::NotFound`].
    pub async fn handle(&self, method: &str, target: &str) -> Result<Response> {
        let Some(verb) = Method::parse(method) else {
            return Err(RouterError::NotFound {
                method: method.to_ascii_uppercase(),
                path: String::from(target),
            });
        };
        self.dispatch(Request::from_target(verb, target)).await
    }
}
