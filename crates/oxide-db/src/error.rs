//! Error types for database access.

use oxide_query::QueryError;
use thiserror::Error;

/// Database errors.
///
/// Driver errors are passed through unchanged, with the SQL that caused
/// them attached.
#[derive(Debug, Error)]
pub enum DbError {
    /// The driver rejected or failed a statement.
    #[error("database error: {source} (SQL: {sql})")]
    Database {
        /// The driver error.
        source: sqlx::Error,
        /// The SQL text that was sent.
        sql: String,
    },

    /// Opening the connection failed.
    #[error("could not connect to [{url}]: {source}")]
    Connect {
        /// The driver error.
        source: sqlx::Error,
        /// The connection URL.
        url: String,
    },

    /// The builder state could not be compiled.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// No configuration exists under this connection name.
    #[error("database connection [{0}] not configured")]
    ConnectionNotConfigured(String),

    /// The statement did not insert a row, so there is no key to return.
    #[error("statement did not generate a primary key")]
    NoInsertId,

    /// A column holds a value type the row shape cannot represent.
    #[error("unsupported value type [{type_name}] in column [{column}]")]
    UnsupportedValue {
        /// Column name.
        column: String,
        /// Driver type name.
        type_name: String,
    },

    /// A column value could not be decoded.
    #[error("could not decode column [{column}]: {source}")]
    Decode {
        /// Column name.
        column: String,
        /// The driver error.
        source: sqlx::Error,
    },
}

impl DbError {
    pub(crate) fn database(source: sqlx::Error, sql: &str) -> Self {
        Self::Database {
            source,
            sql: String::from(sql),
        }
    }
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
