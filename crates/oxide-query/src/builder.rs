//! Chainable query state.
//!
//! A [`QueryBuilder`] only records intent. Nothing is compiled until a
//! [`Grammar`](crate::Grammar) turns it into SQL text plus bindings.

use crate::expression::{Expression, Identifier};
use crate::value::{SqlValue, ToSqlValue};

/// Boolean keyword joining a condition to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    /// AND
    And,
    /// OR
    Or,
}

impl Boolean {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// The right-hand side of a WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Compiles to `IS [NOT] NULL`.
    Null,
    /// Compiles to `<op> ?`.
    Value(SqlValue),
    /// Compiles to `[NOT] IN (?, ...)`.
    List(Vec<SqlValue>),
}

impl Operand {
    /// Wraps a single value, mapping SQL NULL to [`Operand::Null`].
    #[must_use]
    pub fn from_value(value: SqlValue) -> Self {
        if value.is_null() {
            Self::Null
        } else {
            Self::Value(value)
        }
    }
}

/// Conversion into a WHERE operand.
///
/// Scalars become single values (`None` becomes NULL); vectors, slices and
/// arrays become IN lists. Byte vectors and slices are single BLOB values.
pub trait IntoOperand {
    /// Converts `self` into an [`Operand`].
    fn into_operand(self) -> Operand;
}

macro_rules! scalar_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoOperand for $ty {
                fn into_operand(self) -> Operand {
                    Operand::from_value(self.to_sql_value())
                }
            }
        )*
    };
}

scalar_operand!(
    SqlValue, bool, i64, i32, i16, i8, u32, u16, u8, f64, f32, String, &String, &str, Vec<u8>,
    &[u8],
);

impl<T: ToSqlValue> IntoOperand for Option<T> {
    fn into_operand(self) -> Operand {
        Operand::from_value(self.to_sql_value())
    }
}

// Bytes are excluded: `Vec<u8>` and `&[u8]` are single BLOB values.
macro_rules! list_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoOperand for Vec<$ty> {
                fn into_operand(self) -> Operand {
                    Operand::List(self.into_iter().map(ToSqlValue::to_sql_value).collect())
                }
            }

            impl IntoOperand for &[$ty] {
                fn into_operand(self) -> Operand {
                    Operand::List(self.iter().cloned().map(ToSqlValue::to_sql_value).collect())
                }
            }

            impl<const N: usize> IntoOperand for [$ty; N] {
                fn into_operand(self) -> Operand {
                    Operand::List(self.into_iter().map(ToSqlValue::to_sql_value).collect())
                }
            }
        )*
    };
}

list_operand!(SqlValue, bool, i64, i32, i16, i8, u32, u16, f64, f32, String, &String, &str);

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

/// A single accumulated WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// `column operator operand`
    Basic {
        /// Left-hand column.
        column: Identifier,
        /// Comparison operator as given by the caller.
        operator: String,
        /// Right-hand side.
        operand: Operand,
        /// Joining keyword.
        boolean: Boolean,
    },
    /// A parenthesised group of conditions.
    Nested {
        /// Conditions inside the parentheses.
        wheres: Vec<Where>,
        /// Joining keyword.
        boolean: Boolean,
    },
}

impl Where {
    /// Returns the boolean keyword joining this condition.
    #[must_use]
    pub const fn boolean(&self) -> Boolean {
        match self {
            Self::Basic { boolean, .. } | Self::Nested { boolean, .. } => *boolean,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl Direction {
    /// Parses a direction. `"asc"` in any case is ascending, anything else
    /// is descending.
    #[must_use]
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Column to order by
    pub column: Identifier,
    /// Order direction
    pub direction: Direction,
}

/// Aggregate functions supported by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// COUNT
    Count,
    /// MIN
    Min,
    /// MAX
    Max,
    /// SUM
    Sum,
    /// AVG
    Avg,
}

impl Aggregate {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// Accumulated intent for one logical query.
///
/// # Example
///
/// ```
/// use oxide_query::{Grammar, QueryBuilder};
///
/// let query = QueryBuilder::new("users")
///     .where_op("username", "!=", "admin")
///     .order_by("name", "desc")
///     .limit(2);
///
/// let compiled = Grammar::default().compile_select(&query).unwrap();
/// assert_eq!(
///     compiled.sql,
///     r#"SELECT * FROM "users" WHERE "username" != ? ORDER BY "name" DESC LIMIT 2"#
/// );
/// assert_eq!(compiled.bindings.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) table: String,
    pub(crate) columns: Vec<Identifier>,
    pub(crate) distinct: bool,
    pub(crate) wheres: Vec<Where>,
    pub(crate) orders: Vec<Order>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl QueryBuilder {
    /// Creates a builder targeting `table` (unprefixed).
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Sets the columns to select.
    #[must_use]
    pub fn select<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Identifier>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a single column or raw expression to the projection.
    #[must_use]
    pub fn add_select(mut self, column: impl Into<Identifier>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Appends a raw SQL expression to the projection, emitted unquoted.
    #[must_use]
    pub fn select_raw(self, sql: impl Into<String>) -> Self {
        self.add_select(Expression::raw(sql))
    }

    /// Makes the query return distinct rows.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds `column = value`, joined with AND.
    ///
    /// A NULL value compiles to `IS NULL`, a list to `IN (...)`.
    #[must_use]
    pub fn where_eq(self, column: impl Into<Identifier>, value: impl IntoOperand) -> Self {
        self.push_where(column, "=", value, Boolean::And)
    }

    /// Adds `column <operator> value`, joined with AND.
    #[must_use]
    pub fn where_op(
        self,
        column: impl Into<Identifier>,
        operator: &str,
        value: impl IntoOperand,
    ) -> Self {
        self.push_where(column, operator, value, Boolean::And)
    }

    /// Adds `column = value`, joined with OR.
    #[must_use]
    pub fn or_where_eq(self, column: impl Into<Identifier>, value: impl IntoOperand) -> Self {
        self.push_where(column, "=", value, Boolean::Or)
    }

    /// Adds `column <operator> value`, joined with OR.
    #[must_use]
    pub fn or_where_op(
        self,
        column: impl Into<Identifier>,
        operator: &str,
        value: impl IntoOperand,
    ) -> Self {
        self.push_where(column, operator, value, Boolean::Or)
    }

    /// Adds `column IS NULL`.
    #[must_use]
    pub fn where_null(self, column: impl Into<Identifier>) -> Self {
        self.push_where(column, "=", Operand::Null, Boolean::And)
    }

    /// Adds `column IS NOT NULL`.
    #[must_use]
    pub fn where_not_null(self, column: impl Into<Identifier>) -> Self {
        self.push_where(column, "!=", Operand::Null, Boolean::And)
    }

    /// Adds a parenthesised group of conditions, joined with AND.
    ///
    /// The closure receives an empty builder; only its conditions are kept.
    #[must_use]
    pub fn where_nested<F>(self, group: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.push_nested(group, Boolean::And)
    }

    /// Adds a parenthesised group of conditions, joined with OR.
    #[must_use]
    pub fn or_where_nested<F>(self, group: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.push_nested(group, Boolean::Or)
    }

    /// Adds an ORDER BY entry. `"asc"` sorts ascending, anything else descending.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<Identifier>, direction: &str) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction: Direction::parse(direction),
        });
        self
    }

    /// Adds a descending ORDER BY entry.
    #[must_use]
    pub fn order_by_desc(self, column: impl Into<Identifier>) -> Self {
        self.order_by(column, "desc")
    }

    /// Limits the number of rows. Values of zero or less leave it unset.
    #[must_use]
    pub fn limit(mut self, n: i64) -> Self {
        match u64::try_from(n) {
            Ok(n) if n > 0 => self.limit = Some(n),
            _ => {}
        }
        self
    }

    /// Skips rows. Values of zero or less leave it unset.
    #[must_use]
    pub fn offset(mut self, n: i64) -> Self {
        match u64::try_from(n) {
            Ok(n) if n > 0 => self.offset = Some(n),
            _ => {}
        }
        self
    }

    /// Returns the unprefixed target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the selected columns. Empty means `*`.
    #[must_use]
    pub fn columns(&self) -> &[Identifier] {
        &self.columns
    }

    /// Returns whether DISTINCT is set.
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Returns the accumulated conditions.
    #[must_use]
    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    /// Returns the accumulated orderings.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Returns the LIMIT, if set.
    #[must_use]
    pub const fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Returns the OFFSET, if set.
    #[must_use]
    pub const fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    fn push_where(
        mut self,
        column: impl Into<Identifier>,
        operator: &str,
        value: impl IntoOperand,
        boolean: Boolean,
    ) -> Self {
        self.wheres.push(Where::Basic {
            column: column.into(),
            operator: String::from(operator),
            operand: value.into_operand(),
            boolean,
        });
        self
    }

    fn push_nested<F>(mut self, group: F, boolean: Boolean) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        let inner = group(Self::default());
        if !inner.wheres.is_empty() {
            self.wheres.push(Where::Nested {
                wheres: inner.wheres,
                boolean,
            });
        }
        self
    }
}
