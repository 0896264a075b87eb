//! Fluent queries executed through a [`Connection`].

use std::mem;

use oxide_query::{Aggregate, CompiledQuery, Identifier, IntoOperand, QueryBuilder, SqlValue, ToSqlValue};

use crate::connection::{last_insert_id, Connection};
use crate::error::Result;
use crate::row::Row;

/// A query against one table, borrowing its connection.
///
/// Chaining methods only record intent. Every execution method compiles
/// the current state afresh, so bindings never leak between statements.
///
/// ```
/// use oxide_db::{Connection, DatabaseConfig};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let conn = Connection::connect(&DatabaseConfig::default()).await.unwrap();
/// conn.statement("CREATE TABLE {users} (id INTEGER PRIMARY KEY, username TEXT)", &[])
///     .await
///     .unwrap();
///
/// let id = conn
///     .table("users")
///     .insert_get_id([("username", "ada")])
///     .await
///     .unwrap();
///
/// let row = conn.table("users").find(id).await.unwrap().unwrap();
/// assert_eq!(row.get_text("username"), Some("ada"));
/// # });
/// ```
#[derive(Debug)]
pub struct Query<'c> {
    connection: &'c Connection,
    builder: QueryBuilder,
    last_query: Option<String>,
}

impl<'c> Query<'c> {
    /// Creates a query against `table` (unprefixed).
    #[must_use]
    pub fn new(connection: &'c Connection, table: impl Into<String>) -> Self {
        Self {
            connection,
            builder: QueryBuilder::new(table),
            last_query: None,
        }
    }

    /// Sets the columns to select.
    #[must_use]
    pub fn select<I, C>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Identifier>,
    {
        self.map(|b| b.select(columns))
    }

    /// Appends a raw SQL expression to the projection.
    #[must_use]
    pub fn select_raw(self, sql: impl Into<String>) -> Self {
        self.map(|b| b.select_raw(sql))
    }

    /// Makes the query return distinct rows.
    #[must_use]
    pub fn distinct(self) -> Self {
        self.map(QueryBuilder::distinct)
    }

    /// Adds `column = value`. NULL compiles to `IS NULL`, a list to `IN`.
    #[must_use]
    pub fn where_eq(self, column: impl Into<Identifier>, value: impl IntoOperand) -> Self {
        self.map(|b| b.where_eq(column, value))
    }

    /// Adds `column <operator> value`.
    #[must_use]
    pub fn where_op(
        self,
        column: impl Into<Identifier>,
        operator: &str,
        value: impl IntoOperand,
    ) -> Self {
        self.map(|b| b.where_op(column, operator, value))
    }

    /// Adds `column = value`, joined with OR.
    #[must_use]
    pub fn or_where_eq(self, column: impl Into<Identifier>, value: impl IntoOperand) -> Self {
        self.map(|b| b.or_where_eq(column, value))
    }

    /// Adds `column <operator> value`, joined with OR.
    #[must_use]
    pub fn or_where_op(
        self,
        column: impl Into<Identifier>,
        operator: &str,
        value: impl IntoOperand,
    ) -> Self {
        self.map(|b| b.or_where_op(column, operator, value))
    }

    /// Adds `column IS NULL`.
    #[must_use]
    pub fn where_null(self, column: impl Into<Identifier>) -> Self {
        self.map(|b| b.where_null(column))
    }

    /// Adds `column IS NOT NULL`.
    #[must_use]
    pub fn where_not_null(self, column: impl Into<Identifier>) -> Self {
        self.map(|b| b.where_not_null(column))
    }

    /// Adds a parenthesised group of conditions, joined with AND.
    #[must_use]
    pub fn where_nested<F>(self, group: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.map(|b| b.where_nested(group))
    }

    /// Adds a parenthesised group of conditions, joined with OR.
    #[must_use]
    pub fn or_where_nested<F>(self, group: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.map(|b| b.or_where_nested(group))
    }

    /// Adds an ORDER BY entry. `"asc"` sorts ascending, anything else descending.
    #[must_use]
    pub fn order_by(self, column: impl Into<Identifier>, direction: &str) -> Self {
        self.map(|b| b.order_by(column, direction))
    }

    /// Adds a descending ORDER BY entry.
    #[must_use]
    pub fn order_by_desc(self, column: impl Into<Identifier>) -> Self {
        self.map(|b| b.order_by_desc(column))
    }

    /// Limits the number of rows. Zero or less is ignored.
    #[must_use]
    pub fn limit(self, n: i64) -> Self {
        self.map(|b| b.limit(n))
    }

    /// Skips rows. Zero or less is ignored.
    #[must_use]
    pub fn offset(self, n: i64) -> Self {
        self.map(|b| b.offset(n))
    }

    /// Returns the accumulated builder state.
    #[must_use]
    pub const fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Returns the SQL of the most recently executed statement.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Compiles the SELECT without running it.
    pub fn to_sql(&self) -> Result<CompiledQuery> {
        Ok(self.connection.grammar().compile_select(&self.builder)?)
    }

    /// Runs the SELECT and returns every matching row.
    pub async fn get(&mut self) -> Result<Vec<Row>> {
        let compiled = self.connection.grammar().compile_select(&self.builder)?;
        self.fetch(compiled).await
    }

    /// Runs the SELECT with `LIMIT 1` and returns the row, if any.
    pub async fn first(&mut self) -> Result<Option<Row>> {
        let builder = self.builder.clone().limit(1);
        let compiled = self.connection.grammar().compile_select(&builder)?;
        Ok(self.fetch(compiled).await?.into_iter().next())
    }

    /// Returns the row whose `id` equals `id`, if any.
    ///
    /// Conditions already on the query still apply.
    pub async fn find(&mut self, id: impl ToSqlValue) -> Result<Option<Row>> {
        let builder = self
            .builder
            .clone()
            .where_eq("id", id.to_sql_value())
            .limit(1);
        let compiled = self.connection.grammar().compile_select(&builder)?;
        Ok(self.fetch(compiled).await?.into_iter().next())
    }

    /// Inserts one row and returns the number of inserted rows.
    pub async fn insert<I, K, V>(&mut self, data: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        let data = collect_data(data);
        let compiled = self.connection.grammar().compile_insert(&self.builder, &data)?;
        Ok(self.execute(compiled).await?.rows_affected())
    }

    /// Inserts one row and returns its generated primary key.
    pub async fn insert_get_id<I, K, V>(&mut self, data: I) -> Result<i64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        let data = collect_data(data);
        let compiled = self.connection.grammar().compile_insert(&self.builder, &data)?;
        let result = self.execute(compiled).await?;
        last_insert_id(&result)
    }

    /// Updates matching rows and returns how many were affected.
    ///
    /// Without conditions every row in the table is updated.
    pub async fn update<I, K, V>(&mut self, data: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        let data = collect_data(data);
        let compiled = self.connection.grammar().compile_update(&self.builder, &data)?;
        Ok(self.execute(compiled).await?.rows_affected())
    }

    /// Deletes matching rows and returns how many were affected.
    ///
    /// Without conditions every row in the table is deleted.
    pub async fn delete(&mut self) -> Result<u64> {
        let compiled = self.connection.grammar().compile_delete(&self.builder)?;
        Ok(self.execute(compiled).await?.rows_affected())
    }

    /// Counts matching rows.
    pub async fn count(&mut self) -> Result<i64> {
        let value = self.aggregate(Aggregate::Count, "*").await?;
        Ok(value.as_int().unwrap_or(0))
    }

    /// Returns `true` if at least one row matches.
    pub async fn exists(&mut self) -> Result<bool> {
        Ok(self.count().await? > 0)
    }

    /// Returns the smallest value of `column`, or `None` for no rows.
    pub async fn min(&mut self, column: impl Into<Identifier>) -> Result<Option<SqlValue>> {
        let value = self.aggregate(Aggregate::Min, column).await?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Returns the largest value of `column`, or `None` for no rows.
    pub async fn max(&mut self, column: impl Into<Identifier>) -> Result<Option<SqlValue>> {
        let value = self.aggregate(Aggregate::Max, column).await?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Returns the sum of `column`, or `None` for no rows.
    pub async fn sum(&mut self, column: impl Into<Identifier>) -> Result<Option<SqlValue>> {
        let value = self.aggregate(Aggregate::Sum, column).await?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Returns the average of `column`, or `None` for no rows.
    pub async fn avg(&mut self, column: impl Into<Identifier>) -> Result<Option<f64>> {
        let value = self.aggregate(Aggregate::Avg, column).await?;
        Ok(value.as_float())
    }

    async fn aggregate(
        &mut self,
        function: Aggregate,
        column: impl Into<Identifier>,
    ) -> Result<SqlValue> {
        let compiled = self.connection.grammar().compile_aggregate(
            &self.builder,
            function,
            &column.into(),
        )?;
        let rows = self.fetch(compiled).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("aggregate"))
            .cloned()
            .unwrap_or(SqlValue::Null))
    }

    async fn fetch(&mut self, compiled: CompiledQuery) -> Result<Vec<Row>> {
        self.last_query = Some(compiled.sql.clone());
        self.connection.fetch_compiled(&compiled).await
    }

    async fn execute(
        &mut self,
        compiled: CompiledQuery,
    ) -> Result<sqlx::sqlite::SqliteQueryResult> {
        self.last_query = Some(compiled.sql.clone());
        self.connection.execute_compiled(&compiled).await
    }

    fn map(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        self.builder = f(mem::take(&mut self.builder));
        self
    }
}

fn collect_data<I, K, V>(data: I) -> Vec<(String, SqlValue)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToSqlValue,
{
    data.into_iter()
        .map(|(k, v)| (k.into(), v.to_sql_value()))
        .collect()
}
