//! Connection configuration.

use oxide_query::Grammar;
use serde::{Deserialize, Serialize};

/// Settings for one database connection.
///
/// Every field has a default, so `{}` is a valid configuration for an
/// in-memory database.
///
/// ```
/// use oxide_db::DatabaseConfig;
///
/// let config: DatabaseConfig =
///     serde_json::from_str(r#"{ "url": "sqlite://blog.db", "prefix": "blog_" }"#).unwrap();
/// assert_eq!(config.prefix, "blog_");
/// assert_eq!(config.wrapper, '"');
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL.
    pub url: String,
    /// Prefix prepended to every table name.
    pub prefix: String,
    /// Identifier quote character.
    pub wrapper: char,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite::memory:"),
            prefix: String::new(),
            wrapper: '"',
        }
    }
}

impl DatabaseConfig {
    /// Creates a configuration for `url` with no prefix.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the identifier quote character.
    #[must_use]
    pub const fn wrapper(mut self, wrapper: char) -> Self {
        self.wrapper = wrapper;
        self
    }

    /// Returns the grammar matching these settings.
    #[must_use]
    pub fn grammar(&self) -> Grammar {
        Grammar::new(self.prefix.clone(), self.wrapper)
    }
}
