//! Error types for query compilation.

use thiserror::Error;

/// Errors raised while compiling builder state into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The builder has no target table.
    #[error("query has no target table")]
    MissingTable,

    /// An INSERT or UPDATE was given no column values.
    #[error("{0} requires at least one column value")]
    EmptyData(&'static str),

    /// A WHERE condition used an unsupported comparison operator.
    #[error("invalid comparison operator: {0}")]
    InvalidOperator(String),
}

/// Result type alias for query compilation.
pub type Result<T> = std::result::Result<T, QueryError>;
