//! Application settings.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use oxide_db::{ConnectionManager, DatabaseConfig, DEFAULT_CONNECTION};
use serde::{Deserialize, Serialize};

/// Top-level settings, read from a JSON file.
///
/// Missing fields fall back to their defaults, so an empty object is a
/// complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Site name, shown in the page layout.
    pub name: String,
    /// Show error details in responses.
    pub debug: bool,
    /// Global placeholder constraints, applied to every route.
    pub patterns: BTreeMap<String, String>,
    /// Database connections.
    pub database: DatabaseSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: String::from("Mini Framework"),
            debug: false,
            patterns: BTreeMap::from([(String::from("slug"), String::from(".*"))]),
            database: DatabaseSettings::default(),
        }
    }
}

/// Named connections and which one is used by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection used when none is named.
    pub default: String,
    /// Connection settings by name.
    pub connections: BTreeMap<String, DatabaseConfig>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            default: String::from(DEFAULT_CONNECTION),
            connections: BTreeMap::from([(
                String::from(DEFAULT_CONNECTION),
                DatabaseConfig::default(),
            )]),
        }
    }
}

impl AppConfig {
    /// Reads settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parses settings from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Builds a connection manager holding every configured connection.
    #[must_use]
    pub fn connections(&self) -> ConnectionManager {
        self.database
            .connections
            .iter()
            .fold(ConnectionManager::new(&self.database.default), |manager, (name, config)| {
                manager.add(name, config.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.patterns.get("slug").map(String::as_str), Some(".*"));
        assert_eq!(config.connections().names(), ["default"]);
    }

    #[test]
    fn test_partial_settings() {
        let config = AppConfig::from_json(
            r#"{
                "name": "Blog",
                "patterns": { "id": "[0-9]+" },
                "database": {
                    "default": "main",
                    "connections": {
                        "main": { "url": "sqlite::memory:", "prefix": "blog_" }
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.name, "Blog");
        assert!(!config.debug);
        assert!(!config.patterns.contains_key("slug"));

        let manager = config.connections();
        assert_eq!(manager.default_name(), "main");
        assert_eq!(manager.names(), ["main"]);
        assert_eq!(config.database.connections["main"].prefix, "blog_");
        assert_eq!(config.database.connections["main"].wrapper, '"');
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "name": "From file", "debug": true }}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.name, "From file");
        assert!(config.debug);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
