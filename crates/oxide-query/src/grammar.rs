//! SQL fragment compilation.
//!
//! The [`Grammar`] knows the connection's table prefix and identifier quote
//! character. It wraps identifiers and turns a [`QueryBuilder`] into SQL
//! text plus positional bindings.

use crate::builder::{Aggregate, Operand, Order, QueryBuilder, Where};
use crate::error::{QueryError, Result};
use crate::expression::Identifier;
use crate::value::SqlValue;

/// Comparison operators accepted in WHERE conditions.
const OPERATORS: &[&str] = &["=", "!=", "<>", "<", "<=", ">", ">=", "LIKE", "NOT LIKE"];

/// Compiled SQL text with its bindings, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Values for the placeholders.
    pub bindings: Vec<SqlValue>,
}

impl CompiledQuery {
    /// Creates a compiled query.
    #[must_use]
    pub const fn new(sql: String, bindings: Vec<SqlValue>) -> Self {
        Self { sql, bindings }
    }
}

/// Identifier wrapping and statement compilation for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    prefix: String,
    quote: char,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new("", '"')
    }
}

impl Grammar {
    /// Creates a grammar with a table prefix and identifier quote character.
    #[must_use]
    pub fn new(prefix: impl Into<String>, quote: char) -> Self {
        Self {
            prefix: prefix.into(),
            quote,
        }
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the identifier quote character.
    #[must_use]
    pub const fn quote(&self) -> char {
        self.quote
    }

    /// Wraps a column reference.
    ///
    /// Raw expressions pass through unchanged. Qualified names
    /// (`table.column`) get the table prefix on their table segment.
    #[must_use]
    pub fn wrap(&self, identifier: &Identifier) -> String {
        match identifier {
            Identifier::Raw(expr) => String::from(expr.value()),
            Identifier::Name(name) => self.wrap_column(name),
        }
    }

    /// Wraps a column name given as text.
    #[must_use]
    pub fn wrap_column(&self, name: &str) -> String {
        match name.rsplit_once('.') {
            Some((table, column)) => {
                format!("{}.{}", self.wrap_table(table), self.wrap_segment(column))
            }
            None => self.wrap_segment(name),
        }
    }

    /// Prefixes and wraps a table name.
    #[must_use]
    pub fn wrap_table(&self, table: &str) -> String {
        match table.rsplit_once('.') {
            Some((schema, name)) => format!(
                "{}.{}",
                self.wrap_segment(schema),
                self.wrap_segment(&format!("{}{name}", self.prefix))
            ),
            None => self.wrap_segment(&format!("{}{table}", self.prefix)),
        }
    }

    /// Wraps a single identifier segment. `*` is never quoted.
    #[must_use]
    pub fn wrap_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return String::from(segment);
        }
        let quote = self.quote;
        let escaped = segment.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Compiles a SELECT statement.
    pub fn compile_select(&self, query: &QueryBuilder) -> Result<CompiledQuery> {
        let table = self.target_table(query)?;
        let mut bindings = Vec::new();

        let columns = if query.columns.is_empty() {
            String::from("*")
        } else {
            query
                .columns
                .iter()
                .map(|c| self.wrap(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = String::from("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&columns);
        sql.push_str(" FROM ");
        sql.push_str(&table);
        sql.push_str(&self.compile_wheres(&query.wheres, &mut bindings)?);
        sql.push_str(&self.compile_orders(&query.orders));
        sql.push_str(&Self::compile_paging(query.limit, query.offset));

        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Compiles an aggregate SELECT (`COUNT`, `MIN`, ...) over one column.
    pub fn compile_aggregate(
        &self,
        query: &QueryBuilder,
        function: Aggregate,
        column: &Identifier,
    ) -> Result<CompiledQuery> {
        let table = self.target_table(query)?;
        let mut bindings = Vec::new();

        let mut column = self.wrap(column);
        if query.distinct && column != "*" {
            column = format!("DISTINCT {column}");
        }

        let mut sql = format!(
            "SELECT {}({column}) AS {} FROM {table}",
            function.as_str(),
            self.wrap_segment("aggregate")
        );
        sql.push_str(&self.compile_wheres(&query.wheres, &mut bindings)?);

        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Compiles an INSERT with one placeholder per field.
    pub fn compile_insert(
        &self,
        query: &QueryBuilder,
        data: &[(String, SqlValue)],
    ) -> Result<CompiledQuery> {
        let table = self.target_table(query)?;
        if data.is_empty() {
            return Err(QueryError::EmptyData("INSERT"));
        }

        let fields: Vec<String> = data.iter().map(|(f, _)| self.wrap_column(f)).collect();
        let placeholders = vec![SqlValue::placeholder(); data.len()].join(", ");
        let bindings = data.iter().map(|(_, v)| v.clone()).collect();

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            fields.join(", ")
        );
        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Compiles an UPDATE restricted by the accumulated conditions.
    ///
    /// Without conditions the statement is unrestricted.
    pub fn compile_update(
        &self,
        query: &QueryBuilder,
        data: &[(String, SqlValue)],
    ) -> Result<CompiledQuery> {
        let table = self.target_table(query)?;
        if data.is_empty() {
            return Err(QueryError::EmptyData("UPDATE"));
        }

        let mut bindings: Vec<SqlValue> = Vec::with_capacity(data.len());
        let assignments: Vec<String> = data
            .iter()
            .map(|(field, value)| {
                bindings.push(value.clone());
                format!("{} = {}", self.wrap_column(field), SqlValue::placeholder())
            })
            .collect();

        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        sql.push_str(&self.compile_wheres(&query.wheres, &mut bindings)?);

        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Compiles a DELETE restricted by the accumulated conditions.
    ///
    /// Without conditions the statement is unrestricted.
    pub fn compile_delete(&self, query: &QueryBuilder) -> Result<CompiledQuery> {
        let table = self.target_table(query)?;
        let mut bindings = Vec::new();

        let mut sql = format!("DELETE FROM {table}");
        sql.push_str(&self.compile_wheres(&query.wheres, &mut bindings)?);

        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Compiles the WHERE clause, including its leading space and keyword.
    ///
    /// Returns an empty string when there are no conditions.
    pub fn compile_wheres(&self, wheres: &[Where], bindings: &mut Vec<SqlValue>) -> Result<String> {
        if wheres.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" WHERE {}", self.compile_conditions(wheres, bindings)?))
    }

    /// Compiles the ORDER BY clause, or an empty string.
    #[must_use]
    pub fn compile_orders(&self, orders: &[Order]) -> String {
        if orders.is_empty() {
            return String::new();
        }
        let items: Vec<String> = orders
            .iter()
            .map(|o| format!("{} {}", self.wrap(&o.column), o.direction.as_str()))
            .collect();
        format!(" ORDER BY {}", items.join(", "))
    }

    /// Compiles the LIMIT clause. Zero is never emitted.
    #[must_use]
    pub fn compile_limit(limit: Option<u64>) -> String {
        limit
            .filter(|n| *n > 0)
            .map_or_else(String::new, |n| format!(" LIMIT {n}"))
    }

    /// Compiles the OFFSET clause. Zero is never emitted.
    #[must_use]
    pub fn compile_offset(offset: Option<u64>) -> String {
        offset
            .filter(|n| *n > 0)
            .map_or_else(String::new, |n| format!(" OFFSET {n}"))
    }

    // SQLite rejects OFFSET without LIMIT; `LIMIT -1` means no limit.
    fn compile_paging(limit: Option<u64>, offset: Option<u64>) -> String {
        let limit = limit.filter(|n| *n > 0);
        let offset = offset.filter(|n| *n > 0);
        match (limit, offset) {
            (None, Some(_)) => format!(" LIMIT -1{}", Self::compile_offset(offset)),
            _ => Self::compile_limit(limit) + &Self::compile_offset(offset),
        }
    }

    fn compile_conditions(&self, wheres: &[Where], bindings: &mut Vec<SqlValue>) -> Result<String> {
        let mut sql = String::new();

        for (index, clause) in wheres.iter().enumerate() {
            // The first condition has nothing to join to.
            if index > 0 {
                sql.push(' ');
                sql.push_str(clause.boolean().as_str());
                sql.push(' ');
            }

            match clause {
                Where::Basic {
                    column,
                    operator,
                    operand,
                    ..
                } => sql.push_str(&self.compile_basic(column, operator, operand, bindings)?),
                Where::Nested { wheres, .. } => {
                    sql.push('(');
                    sql.push_str(&self.compile_conditions(wheres, bindings)?);
                    sql.push(')');
                }
            }
        }

        Ok(sql)
    }

    fn compile_basic(
        &self,
        column: &Identifier,
        operator: &str,
        operand: &Operand,
        bindings: &mut Vec<SqlValue>,
    ) -> Result<String> {
        let column = self.wrap(column);
        let operator = normalize_operator(operator)?;
        let negated = operator != "=";
        let not = if negated { "NOT " } else { "" };

        let sql = match operand {
            Operand::Null => format!("{column} IS {not}NULL"),
            Operand::List(values) if values.is_empty() => {
                String::from(if negated { "1 = 1" } else { "0 = 1" })
            }
            Operand::List(values) => {
                bindings.extend(values.iter().cloned());
                let placeholders = vec![SqlValue::placeholder(); values.len()].join(", ");
                format!("{column} {not}IN ({placeholders})")
            }
            Operand::Value(value) => {
                bindings.push(value.clone());
                format!("{column} {operator} {}", SqlValue::placeholder())
            }
        };

        Ok(sql)
    }

    fn target_table(&self, query: &QueryBuilder) -> Result<String> {
        if query.table.trim().is_empty() {
            return Err(QueryError::MissingTable);
        }
        Ok(self.wrap_table(&query.table))
    }
}

fn normalize_operator(operator: &str) -> Result<&'static str> {
    let upper = operator.trim().to_ascii_uppercase();
    OPERATORS
        .iter()
        .find(|op| **op == upper)
        .copied()
        .ok_or_else(|| QueryError::InvalidOperator(String::from(operator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;

    fn grammar() -> Grammar {
        Grammar::default()
    }

    #[test]
    fn test_wrap_identifier() {
        let g = Grammar::new("", '`');
        assert_eq!(g.wrap(&"order".into()), "`order`");
        assert_eq!(g.wrap(&"*".into()), "*");
    }

    #[test]
    fn test_wrap_qualified_and_prefixed() {
        let g = Grammar::new("app_", '"');
        assert_eq!(g.wrap_table("users"), r#""app_users""#);
        assert_eq!(g.wrap_column("users.name"), r#""app_users"."name""#);
        assert_eq!(g.wrap_column("users.*"), r#""app_users".*"#);
        assert_eq!(g.wrap_column("name"), r#""name""#);
    }

    #[test]
    fn test_wrap_escapes_quote_character() {
        assert_eq!(grammar().wrap_segment(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_raw_expression_is_not_quoted() {
        let ident = Identifier::from(Expression::raw("COUNT(*) AS total"));
        assert_eq!(grammar().wrap(&ident), "COUNT(*) AS total");
    }

    #[test]
    fn test_select_all() {
        let compiled = grammar().compile_select(&QueryBuilder::new("users")).unwrap();
        assert_eq!(compiled.sql, r#"SELECT * FROM "users""#);
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_select_columns_distinct() {
        let q = QueryBuilder::new("orders").select(["status"]).distinct();
        let compiled = grammar().compile_select(&q).unwrap();
        assert_eq!(compiled.sql, r#"SELECT DISTINCT "status" FROM "orders""#);
    }

    #[test]
    fn test_where_in_list() {
        let q = QueryBuilder::new("users").where_eq("id", vec![1_i64, 3, 4]);
        let compiled = grammar().compile_select(&q).unwrap();
        assert_eq!(compiled.sql, r#"SELECT * FROM "users" WHERE "id" IN (?, ?, ?)"#);
        assert_eq!(
            compiled.bindings,
            vec![SqlValue::Int(1), SqlValue::Int(3), SqlValue::Int(4)]
        );
    }

    #[test]
    fn test_where_not_in_list() {
        let q = QueryBuilder::new("users").where_op("id", "!=", vec![7_i64, 8]);
        let compiled = grammar().compile_select(&q).unwrap();
        assert!(compiled.sql.ends_with(r#"WHERE "id" NOT IN (?, ?)"#));
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let q = QueryBuilder::new("users").where_eq("id", Vec::<i64>::new());
        let compiled = grammar().compile_select(&q).unwrap();
        assert!(compiled.sql.ends_with("WHERE 0 = 1"));
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_where_null_and_not_null() {
        let q = QueryBuilder::new("posts")
            .where_eq("deleted_at", None::<i64>)
            .where_not_null("published_at");
        let compiled = grammar().compile_select(&q).unwrap();
        assert!(compiled
            .sql
            .ends_with(r#"WHERE "deleted_at" IS NULL AND "published_at" IS NOT NULL"#));
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_first_boolean_is_dropped() {
        let q = QueryBuilder::new("users")
            .or_where_eq("a", 1)
            .or_where_eq("b", 2);
        let compiled = grammar().compile_select(&q).unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "users" WHERE "a" = ? OR "b" = ?"#
        );
    }

    #[test]
    fn test_where_order_limit() {
        let q = QueryBuilder::new("users")
            .where_op("username", "!=", "admin")
            .order_by("name", "desc")
            .limit(2);
        let compiled = grammar().compile_select(&q).unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "users" WHERE "username" != ? ORDER BY "name" DESC LIMIT 2"#
        );
        assert_eq!(compiled.bindings, vec![SqlValue::Text("admin".into())]);
    }

    #[test]
    fn test_limit_and_offset() {
        let q = QueryBuilder::new("users").limit(10).offset(20);
        let compiled = grammar().compile_select(&q).unwrap();
        assert!(compiled.sql.ends_with("LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn test_zero_paging_is_not_emitted() {
        assert_eq!(Grammar::compile_limit(Some(0)), "");
        assert_eq!(Grammar::compile_offset(Some(0)), "");
        assert_eq!(Grammar::compile_offset(Some(5)), " OFFSET 5");
        assert_eq!(Grammar::compile_limit(None), "");
    }

    #[test]
    fn test_offset_without_limit_is_unbounded() {
        let q = QueryBuilder::new("users").order_by("id", "asc").offset(1);
        let compiled = grammar().compile_select(&q).unwrap();
        assert!(compiled.sql.ends_with(r#"ORDER BY "id" ASC LIMIT -1 OFFSET 1"#));

        let q = QueryBuilder::new("users").offset(0);
        let compiled = grammar().compile_select(&q).unwrap();
        assert!(!compiled.sql.contains("LIMIT"));
        assert!(!compiled.sql.contains("OFFSET"));
    }

    #[test]
    fn test_nested_group() {
        let q = QueryBuilder::new("users")
            .where_eq("active", true)
            .where_nested(|q| q.where_eq("role", "admin").or_where_op("karma", ">", 100));
        let compiled = grammar().compile_select(&q).unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT * FROM "users" WHERE "active" = ? AND ("role" = ? OR "karma" > ?)"#
        );
        assert_eq!(compiled.bindings.len(), 3);
    }

    #[test]
    fn test_invalid_operator_is_rejected() {
        let q = QueryBuilder::new("users").where_op("id", "; DROP TABLE users", 1);
        assert!(matches!(
            grammar().compile_select(&q),
            Err(QueryError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_operator_is_case_insensitive() {
        let q = QueryBuilder::new("users").where_op("email", "like", "%@example.com");
        let compiled = grammar().compile_select(&q).unwrap();
        assert!(compiled.sql.ends_with(r#"WHERE "email" LIKE ?"#));
    }

    #[test]
    fn test_insert() {
        let data = vec![
            (String::from("username"), SqlValue::Text("alice".into())),
            (String::from("age"), SqlValue::Int(30)),
        ];
        let compiled = grammar()
            .compile_insert(&QueryBuilder::new("users"), &data)
            .unwrap();
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "users" ("username", "age") VALUES (?, ?)"#
        );
        assert_eq!(compiled.bindings.len(), 2);
    }

    #[test]
    fn test_insert_requires_data() {
        assert_eq!(
            grammar().compile_insert(&QueryBuilder::new("users"), &[]),
            Err(QueryError::EmptyData("INSERT"))
        );
    }

    #[test]
    fn test_update_binds_data_before_conditions() {
        let data = vec![(String::from("name"), SqlValue::Text("bob".into()))];
        let q = QueryBuilder::new("users").where_eq("id", 9);
        let compiled = grammar().compile_update(&q, &data).unwrap();
        assert_eq!(
            compiled.sql,
            r#"UPDATE "users" SET "name" = ? WHERE "id" = ?"#
        );
        assert_eq!(
            compiled.bindings,
            vec![SqlValue::Text("bob".into()), SqlValue::Int(9)]
        );
    }

    #[test]
    fn test_update_without_where_is_unrestricted() {
        let data = vec![(String::from("active"), SqlValue::Bool(false))];
        let compiled = grammar()
            .compile_update(&QueryBuilder::new("users"), &data)
            .unwrap();
        assert_eq!(compiled.sql, r#"UPDATE "users" SET "active" = ?"#);
        assert!(!compiled.sql.contains("WHERE"));
    }

    #[test]
    fn test_delete() {
        let q = QueryBuilder::new("users").where_eq("id", 3);
        let compiled = grammar().compile_delete(&q).unwrap();
        assert_eq!(compiled.sql, r#"DELETE FROM "users" WHERE "id" = ?"#);

        let compiled = grammar()
            .compile_delete(&QueryBuilder::new("users"))
            .unwrap();
        assert_eq!(compiled.sql, r#"DELETE FROM "users""#);
    }

    #[test]
    fn test_aggregate() {
        let q = QueryBuilder::new("posts").where_eq("published", true);
        let compiled = grammar()
            .compile_aggregate(&q, Aggregate::Count, &"*".into())
            .unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT COUNT(*) AS "aggregate" FROM "posts" WHERE "published" = ?"#
        );

        let q = QueryBuilder::new("posts").distinct();
        let compiled = grammar()
            .compile_aggregate(&q, Aggregate::Count, &"author_id".into())
            .unwrap();
        assert!(compiled.sql.starts_with(r#"SELECT COUNT(DISTINCT "author_id")"#));
    }

    #[test]
    fn test_missing_table() {
        assert_eq!(
            grammar().compile_delete(&QueryBuilder::default()),
            Err(QueryError::MissingTable)
        );
    }

    #[test]
    fn test_sql_injection_prevention() {
        let malicious = "'; DROP TABLE users; --";
        let q = QueryBuilder::new("users").where_eq("name", malicious);
        let compiled = grammar().compile_select(&q).unwrap();
        assert_eq!(compiled.sql, r#"SELECT * FROM "users" WHERE "name" = ?"#);
        assert_eq!(compiled.bindings, vec![SqlValue::Text(malicious.into())]);
    }
}
