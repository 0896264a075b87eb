//! The database connection and its raw-SQL entry points.

use oxide_query::{CompiledQuery, Grammar, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteQueryResult};
use sqlx::Sqlite;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{DbError, Result};
use crate::query::Query;
use crate::row::Row;

/// One logical database connection with its table prefix and quoting.
///
/// Raw-SQL entry points expand `{table}` and `{table.column}` markers
/// before executing; see [`Connection::prepare`]. Statements built with
/// [`Connection::table`] are wrapped programmatically instead.
#[derive(Debug, Clone)]
pub struct Connection {
    pool: SqlitePool,
    grammar: Grammar,
}

impl Connection {
    /// Opens a connection.
    ///
    /// The underlying pool holds exactly one physical connection that is
    /// never recycled, so in-memory databases live as long as the
    /// connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&config.url)
            .await
            .map_err(|source| DbError::Connect {
                source,
                url: config.url.clone(),
            })?;

        debug!(url = %config.url, prefix = %config.prefix, "Connected to database");
        Ok(Self::from_pool(pool, config.grammar()))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: SqlitePool, grammar: Grammar) -> Self {
        Self { pool, grammar }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the grammar used to wrap identifiers.
    #[must_use]
    pub const fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        self.grammar.prefix()
    }

    /// Starts a fluent query against `table` (unprefixed).
    #[must_use]
    pub fn table(&self, table: impl Into<String>) -> Query<'_> {
        Query::new(self, table)
    }

    /// Wraps a single identifier in the quote character. `*` is returned
    /// unchanged.
    #[must_use]
    pub fn wrap(&self, value: &str) -> String {
        self.grammar.wrap_segment(value)
    }

    /// Expands `{table}` and `{table.column}` markers into prefixed,
    /// quoted identifiers.
    ///
    /// ```
    /// use oxide_db::Connection;
    /// use oxide_query::Grammar;
    /// use sqlx::sqlite::SqlitePool;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    /// let conn = Connection::from_pool(pool, Grammar::new("blog_", '"'));
    /// assert_eq!(
    ///     conn.prepare("SELECT {posts.*} FROM {posts} WHERE {posts.id} = ?"),
    ///     r#"SELECT "blog_posts".* FROM "blog_posts" WHERE "blog_posts"."id" = ?"#
    /// );
    /// # });
    /// ```
    #[must_use]
    pub fn prepare(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut rest = sql;

        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open + 1..].find('}') else {
                break;
            };
            let marker = &rest[open + 1..open + 1 + len];

            out.push_str(&rest[..open]);
            match marker.split_once('.') {
                Some((table, field)) => {
                    out.push_str(&self.grammar.wrap_table(table));
                    out.push('.');
                    out.push_str(&self.grammar.wrap_segment(field));
                }
                None => out.push_str(&self.grammar.wrap_table(marker)),
            }

            rest = &rest[open + len + 2..];
        }

        out.push_str(rest);
        out
    }

    /// Runs a raw SELECT and returns every row.
    pub async fn select(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>> {
        self.fetch(&self.prepare(sql), bindings).await
    }

    /// Runs a raw SELECT and returns the first row, if any.
    pub async fn select_one(&self, sql: &str, bindings: &[SqlValue]) -> Result<Option<Row>> {
        Ok(self.select(sql, bindings).await?.into_iter().next())
    }

    /// Runs a raw INSERT and returns the number of inserted rows.
    pub async fn insert(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        self.affecting_statement(sql, bindings).await
    }

    /// Runs a raw INSERT and returns the generated primary key.
    pub async fn insert_get_id(&self, sql: &str, bindings: &[SqlValue]) -> Result<i64> {
        let result = self.execute(&self.prepare(sql), bindings).await?;
        last_insert_id(&result)
    }

    /// Runs a raw UPDATE and returns the number of affected rows.
    pub async fn update(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        self.affecting_statement(sql, bindings).await
    }

    /// Runs a raw DELETE and returns the number of affected rows.
    pub async fn delete(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        self.affecting_statement(sql, bindings).await
    }

    /// Runs any raw statement.
    pub async fn statement(&self, sql: &str, bindings: &[SqlValue]) -> Result<()> {
        self.execute(&self.prepare(sql), bindings).await?;
        Ok(())
    }

    /// Runs a raw statement and returns the number of affected rows.
    pub async fn affecting_statement(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        let result = self.execute(&self.prepare(sql), bindings).await?;
        Ok(result.rows_affected())
    }

    /// Closes the connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) async fn fetch_compiled(&self, compiled: &CompiledQuery) -> Result<Vec<Row>> {
        self.fetch(&compiled.sql, &compiled.bindings).await
    }

    pub(crate) async fn execute_compiled(
        &self,
        compiled: &CompiledQuery,
    ) -> Result<SqliteQueryResult> {
        self.execute(&compiled.sql, &compiled.bindings).await
    }

    async fn fetch(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>> {
        debug!(sql = %sql, bindings = bindings.len(), "Executing SQL");

        let rows = bind_all(sqlx::query(sql), bindings)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbError::database(e, sql))?;

        rows.iter().map(Row::from_sqlite).collect()
    }

    async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<SqliteQueryResult> {
        debug!(sql = %sql, bindings = bindings.len(), "Executing SQL");

        bind_all(sqlx::query(sql), bindings)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::database(e, sql))
    }
}

pub(crate) fn last_insert_id(result: &SqliteQueryResult) -> Result<i64> {
    if result.rows_affected() == 0 {
        return Err(DbError::NoInsertId);
    }
    Ok(result.last_insert_rowid())
}

type RawQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_all<'q>(mut query: RawQuery<'q>, bindings: &[SqlValue]) -> RawQuery<'q> {
    for value in bindings {
        query = bind_value(query, value.clone());
    }
    query
}

/// Binds a `SqlValue` to a raw query.
fn bind_value(query: RawQuery<'_>, value: SqlValue) -> RawQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}
