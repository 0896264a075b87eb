//! Raw SQL expressions and identifier references.

use std::fmt;

/// A raw SQL fragment that is emitted verbatim, never quoted.
///
/// **Warning**: Only use this for SQL fragments that don't contain user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression(String);

impl Expression {
    /// Creates a new raw expression.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// Returns the raw SQL text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column or table reference as written by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// A name that is wrapped in the connection's quote character.
    Name(String),
    /// A raw expression passed through unchanged.
    Raw(Expression),
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::Name(String::from(name))
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<Expression> for Identifier {
    fn from(expr: Expression) -> Self {
        Self::Raw(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_display() {
        let expr = Expression::raw("COUNT(*)");
        assert_eq!(expr.to_string(), "COUNT(*)");
        assert_eq!(expr.value(), "COUNT(*)");
    }

    #[test]
    fn test_identifier_conversions() {
        assert_eq!(Identifier::from("id"), Identifier::Name("id".into()));
        assert_eq!(
            Identifier::from(Expression::raw("NOW()")),
            Identifier::Raw(Expression::raw("NOW()"))
        );
    }
}
