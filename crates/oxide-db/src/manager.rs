//! Named connections, opened on first use.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::connection::Connection;
use crate::error::{DbError, Result};

/// Name of the connection used when none is given.
pub const DEFAULT_CONNECTION: &str = "default";

/// Holds connection settings by name and caches opened connections.
#[derive(Debug)]
pub struct ConnectionManager {
    configs: HashMap<String, DatabaseConfig>,
    default: String,
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION)
    }
}

impl ConnectionManager {
    /// Creates a manager whose default connection is `default`.
    #[must_use]
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            configs: HashMap::new(),
            default: default.into(),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Registers settings under `name`, replacing earlier settings.
    ///
    /// A connection already opened under that name stays cached until
    /// [`ConnectionManager::disconnect`] is called.
    #[must_use]
    pub fn add(mut self, name: impl Into<String>, config: DatabaseConfig) -> Self {
        self.configs.insert(name.into(), config);
        self
    }

    /// Returns the name of the default connection.
    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Returns the configured connection names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the named connection, opening it on first use.
    ///
    /// `None` selects the default connection.
    pub async fn connection(&self, name: Option<&str>) -> Result<Arc<Connection>> {
        let name = name.unwrap_or(&self.default);
        let mut connections = self.connections.lock().await;

        if let Some(connection) = connections.get(name) {
            return Ok(Arc::clone(connection));
        }

        let config = self
            .configs
            .get(name)
            .ok_or_else(|| DbError::ConnectionNotConfigured(String::from(name)))?;

        debug!(name = %name, "Opening connection");
        let connection = Arc::new(Connection::connect(config).await?);
        connections.insert(String::from(name), Arc::clone(&connection));
        Ok(connection)
    }

    /// Closes and forgets the named connection. Returns `false` if it was
    /// not open.
    pub async fn disconnect(&self, name: Option<&str>) -> bool {
        let name = name.unwrap_or(&self.default);
        let removed = self.connections.lock().await.remove(name);

        match removed {
            Some(connection) => {
                connection.close().await;
                debug!(name = %name, "Closed connection");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConnectionManager {
        ConnectionManager::default()
            .add("default", DatabaseConfig::default())
            .add("blog", DatabaseConfig::default().prefix("blog_"))
    }

    #[tokio::test]
    async fn test_connections_are_cached() {
        let manager = manager();

        let first = manager.connection(None).await.unwrap();
        let second = manager.connection(Some("default")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let blog = manager.connection(Some("blog")).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &blog));
        assert_eq!(blog.table_prefix(), "blog_");
    }

    #[tokio::test]
    async fn test_unknown_name_is_rejected() {
        let err = manager().connection(Some("reports")).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionNotConfigured(ref name) if name == "reports"));
    }

    #[tokio::test]
    async fn test_disconnect_reopens_on_next_use() {
        let manager = manager();

        let first = manager.connection(None).await.unwrap();
        assert!(manager.disconnect(None).await);
        assert!(!manager.disconnect(None).await);

        let second = manager.connection(None).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_names_are_sorted() {
        assert_eq!(manager().names(), ["blog", "default"]);
        assert_eq!(manager().default_name(), "default");
    }
}
