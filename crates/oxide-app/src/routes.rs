//! The application route table.

use std::sync::Arc;

use oxide_db::ConnectionManager;
use oxide_router::{ControllerRegistry, Handler, Request, Response, Router};

use crate::config::AppConfig;
use crate::controllers::{escape_html, Sample, SAMPLE};

/// Builds the router: global patterns first, then every route.
pub fn build(config: &AppConfig, db: Arc<ConnectionManager>) -> oxide_router::Result<Router> {
    let site: Arc<str> = Arc::from(config.name.as_str());

    let mut controllers = ControllerRegistry::new();
    controllers.register(SAMPLE, move || {
        Sample::new(Arc::clone(&site), Arc::clone(&db))
    });

    let mut router = Router::with_controllers(controllers);
    for (name, regex) in &config.patterns {
        router.set_constraint(name, regex)?;
    }

    router
        .action(&["GET"], "/", "App.Sample@index")?
        .action(&["GET"], "database", "App.Sample@database")?
        .action(&["GET"], "error", "App.Sample@error")?
        .action(&["GET"], "pages/{page?}", "App.Sample@page")?
        .action(&["GET"], "blog/{slug}", "App.Sample@post")?
        .get("test", |_| async { Ok(Response::text("This is a test.")) })?
        .register_with(
            &["GET"],
            "language/{code}",
            Handler::closure(language),
            &[("code", "[a-z]{2}")],
        )?;

    Ok(router)
}

async fn language(request: Request) -> oxide_router::HandlerResult {
    let code = request.param("code").unwrap_or_default();
    Ok(Response::html(escape_html(code)))
}
