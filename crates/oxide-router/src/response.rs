//! Handler output.

use std::collections::HashMap;

use crate::error::RouterError;

/// What a handler hands back for transport-layer delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates an empty 200 OK response.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Creates a 200 response with HTML content.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::ok()
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body.into())
    }

    /// Creates a 200 response with plain text content.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body.into())
    }

    /// Creates a 200 response with a JSON body.
    pub fn json<T: serde::Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(data)?;
        Ok(Self::ok()
            .header("Content-Type", "application/json")
            .body(body))
    }

    /// Creates a 302 redirect.
    #[must_use]
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::new(302).header("Location", url)
    }

    /// Creates a plain-text response describing a dispatch error.
    #[must_use]
    pub fn from_error(err: &RouterError) -> Self {
        let status = err.status_code();
        let mut response = Self::text(err.to_string()).status(status);
        if status >= 500 {
            response.body = response.status_text().as_bytes().to_vec();
        }
        response
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the status code.
    #[must_use]
    pub const fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the body as a string, if it is valid UTF-8.
    #[must_use]
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Returns the reason phrase for the status code.
    #[must_use]
    pub const fn status_text(&self) -> &'static str {
        match self.status {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            422 => "Unprocessable Entity",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

impl From<String> for Response {
    fn from(body: String) -> Self {
        Self::html(body)
    }
}

impl From<&str> for Response {
    fn from(body: &str) -> Self {
        Self::html(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json() {
        let res = Response::json(&serde_json::json!({"name": "test"})).unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(
            res.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(res.body_string().as_deref(), Some(r#"{"name":"test"}"#));
    }

    #[test]
    fn test_string_becomes_html() {
        let res = Response::from(String::from("<h1>Hi</h1>"));
        assert_eq!(
            res.headers.get("Content-Type").map(String::as_str),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn test_from_error() {
        let res = Response::from_error(&RouterError::NotFound {
            method: "GET".into(),
            path: "/nope".into(),
        });
        assert_eq!(res.status, 404);
        assert_eq!(res.body_string().as_deref(), Some("no route matched: GET /nope"));

        let res = Response::from_error(&RouterError::ControllerNotFound("Blog".into()));
        assert_eq!(res.status, 500);
        assert_eq!(res.body_string().as_deref(), Some("Internal Server Error"));
    }

    #[test]
    fn test_redirect() {
        let res = Response::redirect("/login");
        assert_eq!(res.status, 302);
        assert_eq!(res.status_text(), "Found");
        assert_eq!(res.headers.get("Location").map(String::as_str), Some("/login"));
    }
}
