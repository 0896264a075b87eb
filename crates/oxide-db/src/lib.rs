//! # oxide-db
//!
//! SQLite connections that execute fluent queries and raw SQL.
//!
//! This crate provides:
//! - [`Connection`]: one database with its table prefix and quote character
//! - [`Query`]: a [`oxide_query::QueryBuilder`] bound to a connection, with
//!   `get`, `first`, `find`, `insert`, `update`, `delete` and aggregates
//! - [`Row`]: ordered column/value pairs, serializable as JSON objects
//! - [`ConnectionManager`]: named connections opened on first use
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_db::{Connection, DatabaseConfig};
//! use oxide_query::SqlValue;
//!
//! let conn = Connection::connect(&DatabaseConfig::new("sqlite://blog.db").prefix("blog_")).await?;
//!
//! let posts = conn
//!     .table("posts")
//!     .where_eq("published", true)
//!     .order_by_desc("created_at")
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! // Raw SQL with prefixed, quoted identifiers.
//! let row = conn
//!     .select_one("SELECT {posts.title} FROM {posts} WHERE {posts.id} = ?", &[SqlValue::Int(42)])
//!     .await?;
//! ```
//!
//! Every statement is logged at `debug` level with its SQL text.

mod config;
mod connection;
mod error;
mod manager;
mod query;
mod row;

pub use config::DatabaseConfig;
pub use connection::Connection;
pub use error::{DbError, Result};
pub use manager::{ConnectionManager, DEFAULT_CONNECTION};
pub use query::Query;
pub use row::Row;
