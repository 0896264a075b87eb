//! # oxide-query
//!
//! A fluent SQL query builder that compiles to parameterized SQL.
//!
//! This crate provides:
//! - A chainable [`QueryBuilder`] that records table, columns, conditions,
//!   ordering and paging
//! - A [`Grammar`] that wraps identifiers (with a table prefix and a
//!   configurable quote character) and compiles SELECT, INSERT, UPDATE,
//!   DELETE and aggregate statements
//! - Protection against SQL injection: values only ever travel as bindings
//!
//! No I/O happens here. Executing compiled statements is the job of
//! `oxide-db`.
//!
//! ## Building Queries
//!
//! ```rust
//! use oxide_query::{Grammar, QueryBuilder, SqlValue};
//!
//! let query = QueryBuilder::new("posts")
//!     .select(["id", "title"])
//!     .where_eq("author_id", 7)
//!     .where_eq("status", vec!["draft", "review"])
//!     .order_by("created_at", "desc")
//!     .limit(10);
//!
//! let compiled = Grammar::new("blog_", '"').compile_select(&query).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     r#"SELECT "id", "title" FROM "blog_posts" WHERE "author_id" = ? AND "status" IN (?, ?) ORDER BY "created_at" DESC LIMIT 10"#
//! );
//! assert_eq!(compiled.bindings[0], SqlValue::Int(7));
//! ```
//!
//! ## NULL and Lists
//!
//! A NULL value compiles to `IS NULL`, a list to `IN (...)`. Any operator
//! other than `=` negates them:
//!
//! ```rust
//! use oxide_query::{Grammar, QueryBuilder};
//!
//! let query = QueryBuilder::new("users")
//!     .where_op("deleted_at", "!=", None::<i64>)
//!     .where_op("id", "<>", [1_i64, 2]);
//!
//! let compiled = Grammar::default().compile_select(&query).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     r#"SELECT * FROM "users" WHERE "deleted_at" IS NOT NULL AND "id" NOT IN (?, ?)"#
//! );
//! ```

mod builder;
mod error;
mod expression;
mod grammar;
mod value;

pub use builder::{
    Aggregate, Boolean, Direction, IntoOperand, Operand, Order, QueryBuilder, Where,
};
pub use error::{QueryError, Result};
pub use expression::{Expression, Identifier};
pub use grammar::{CompiledQuery, Grammar};
pub use value::{SqlValue, ToSqlValue};
