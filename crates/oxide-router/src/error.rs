//! Error types for routing.

use thiserror::Error;

/// Error type returned by handlers and controller actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No route matched the request.
    #[error("no route matched: {method} {path}")]
    NotFound { method: String, path: String },

    /// A placeholder name appears twice in one template.
    #[error("route pattern [{pattern}] cannot reference variable name [{name}] more than once")]
    DuplicateParameter { pattern: String, name: String },

    /// A required placeholder follows an optional one.
    #[error("route pattern [{pattern}] cannot reference variable [{name}] after one or more optionals")]
    RequiredAfterOptional { pattern: String, name: String },

    /// The template or one of its constraints is malformed.
    #[error("invalid route pattern [{pattern}]: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A handler string is not of the form `Controller@action`.
    #[error("invalid handler [{0}]: expected Controller@action")]
    InvalidHandler(String),

    /// No controller factory is registered under this key.
    #[error("controller [{0}] is not registered")]
    ControllerNotFound(String),

    /// The controller exists but does not expose the action.
    #[error("controller [{controller}] has no action named [{action}]")]
    ActionNotFound { controller: String, action: String },

    /// The handler ran and failed.
    #[error("action failed: {0}")]
    Action(#[source] BoxError),
}

impl RouterError {
    /// Returns the HTTP status an exception handler should answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Returns `true` for errors raised while defining routes.
    #[must_use]
    pub const fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateParameter { .. }
                | Self::RequiredAfterOptional { .. }
                | Self::InvalidPattern { .. }
        )
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
