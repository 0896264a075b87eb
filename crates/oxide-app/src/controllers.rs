//! Controllers of the reference application.

use std::sync::Arc;

use futures::FutureExt;
use oxide_db::ConnectionManager;
use oxide_router::{BoxFuture, Controller, HandlerResult, Request, Response};
use tracing::debug;

/// Registry key of [`Sample`].
pub const SAMPLE: &str = "App.Sample";

/// Home page, static pages, blog posts and a database listing.
///
/// HTML responses are wrapped in the site layout after every action.
pub struct Sample {
    site: Arc<str>,
    db: Arc<ConnectionManager>,
}

impl Sample {
    /// Creates the controller.
    #[must_use]
    pub const fn new(site: Arc<str>, db: Arc<ConnectionManager>) -> Self {
        Self { site, db }
    }

    async fn database(&self) -> HandlerResult {
        let conn = self.db.connection(None).await?;
        let tables = conn
            .select(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                &[],
            )
            .await?;
        Ok(Response::json(&tables)?)
    }
}

impl Controller for Sample {
    fn actions(&self) -> &[&'static str] {
        &["index", "page", "post", "database", "error"]
    }

    fn invoke<'a>(&'a mut self, action: &'a str, request: Request) -> BoxFuture<'a, HandlerResult> {
        async move {
            match action {
                "index" => Ok(Response::html("<p>This is the Homepage</p>")),
                "page" => Ok(Response::html(uri_block(request.param("page")))),
                "post" => Ok(Response::html(uri_block(request.param("slug")))),
                "database" => self.database().await,
                "error" => Err("the error page was requested".into()),
                other => Err(format!("no action {other}").into()),
            }
        }
        .boxed()
    }

    fn after(&mut self, action: &str, response: Response) -> Response {
        let is_html = response
            .headers
            .get("Content-Type")
            .is_some_and(|t| t.starts_with("text/html"));
        if !is_html {
            return response;
        }

        debug!(action, "Applying layout");
        let content = response.body_string().unwrap_or_default();
        let page = layout(&self.site, &content);
        Response {
            body: page.into_bytes(),
            ..response
        }
    }
}

fn uri_block(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("<pre>URI: '{}'</pre>", escape_html(v)),
        None => String::from("<pre>URI: NULL</pre>"),
    }
}

fn layout(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{}</title></head>\n<body>\n{content}\n</body>\n</html>\n",
        escape_html(title)
    )
}

/// Escapes text for use in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use oxide_db::DatabaseConfig;
    use oxide_router::call_action;

    use super::*;

    fn sample() -> Sample {
        let db = ConnectionManager::default().add("default", DatabaseConfig::default());
        Sample::new(Arc::from("Test Site"), Arc::new(db))
    }

    #[tokio::test]
    async fn test_html_is_wrapped_in_layout() {
        let mut controller = sample();
        let mut request = Request::get("/pages/about");
        request.params.insert("page", "about");

        let res = call_action(&mut controller, "page", request).await.unwrap();
        let body = res.body_string().unwrap();
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<title>Test Site</title>"));
        assert!(body.contains("<pre>URI: 'about'</pre>"));
    }

    #[tokio::test]
    async fn test_missing_parameter_renders_null() {
        let mut controller = sample();
        let res = call_action(&mut controller, "page", Request::get("/pages"))
            .await
            .unwrap();
        assert!(res.body_string().unwrap().contains("URI: NULL"));
    }

    #[tokio::test]
    async fn test_json_is_not_wrapped() {
        let mut controller = sample();
        let res = call_action(&mut controller, "database", Request::get("/database"))
            .await
            .unwrap();
        assert_eq!(res.body_string().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_error_action_fails() {
        let mut controller = sample();
        let err = call_action(&mut controller, "error", Request::get("/error"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
