//! # oxide-app
//!
//! The reference application: a route table of closures and controller
//! actions over a configured set of database connections.
//!
//! ```ignore
//! let app = App::new(AppConfig::load(Path::new("config.json"))?)?;
//! let response = app.handle("GET", "/blog/2024/hello-world").await;
//! ```

pub mod config;
pub mod controllers;
pub mod routes;

use std::sync::Arc;

use oxide_db::ConnectionManager;
use oxide_router::{Response, Router, RouterError};
use tracing::{error, info};

pub use config::{AppConfig, DatabaseSettings};

/// A configured application ready to serve requests.
pub struct App {
    config: AppConfig,
    router: Router,
    db: Arc<ConnectionManager>,
}

impl App {
    /// Builds the connections and route table described by `config`.
    pub fn new(config: AppConfig) -> oxide_router::Result<Self> {
        let db = Arc::new(config.connections());
        let router = routes::build(&config, Arc::clone(&db))?;
        info!(name = %config.name, "Application ready");
        Ok(Self { config, router, db })
    }

    /// Returns the settings.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the route table.
    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the connection manager.
    #[must_use]
    pub const fn db(&self) -> &Arc<ConnectionManager> {
        &self.db
    }

    /// Dispatches a request and turns failures into error responses.
    ///
    /// In debug mode server errors carry their message instead of the
    /// bare status text.
    pub async fn handle(&self, method: &str, target: &str) -> Response {
        match self.router.handle(method, target).await {
            Ok(response) => response,
            Err(err) => self.render_error(&err),
        }
    }

    fn render_error(&self, err: &RouterError) -> Response {
        let status = err.status_code();
        if status >= 500 {
            error!(error = %err, "Request failed");
            if self.config.debug {
                return Response::text(err.to_string()).status(status);
            }
        }
        Response::from_error(err)
    }
}
