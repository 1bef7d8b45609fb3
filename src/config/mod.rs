//! Configuration management.
//!
//! Settings come from a TOML file (`symphony/config.toml` under the platform
//! config dir by default), then environment overrides are applied:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SYMPHONY_DATA_DIR` | `data_dir` |
//! | `NEO4J_HOST` | `graph.uri` |
//! | `NEO4J_USER` | `graph.user` |
//! | `NEO4J_PASSWORD` | `graph.password` |
//!
//! Logging overrides (`SYMPHONY_LOG_*`) are resolved by
//! [`crate::observability::LoggingConfig`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default Bolt URI for the Neo4j graph store.
pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";

/// Main configuration for symphony.
#[derive(Debug, Clone)]
pub struct SymphonyConfig {
    /// Directory holding the default database files.
    pub data_dir: PathBuf,
    /// Relational store settings.
    pub relational: RelationalConfig,
    /// Graph store settings.
    pub graph: GraphConfig,
    /// Social service settings.
    pub social: SocialConfig,
    /// Logging settings (before environment overrides).
    pub logging: LoggingSettings,
}

/// Relational store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationalBackendType {
    /// `SQLite` file (default).
    #[default]
    Sqlite,
    /// In-memory, lost on exit.
    Memory,
}

impl RelationalBackendType {
    /// Parses a backend name; unknown names fall back to `SQLite`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Self::Memory,
            _ => Self::Sqlite,
        }
    }
}

/// Graph store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphBackendType {
    /// `SQLite` file (default).
    #[default]
    Sqlite,
    /// In-memory, lost on exit.
    Memory,
    /// Neo4j server (requires the `neo4j` feature).
    Neo4j,
}

impl GraphBackendType {
    /// Parses a backend name; unknown names fall back to `SQLite`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Self::Memory,
            "neo4j" => Self::Neo4j,
            _ => Self::Sqlite,
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Default)]
pub struct RelationalConfig {
    /// Backend to use.
    pub backend: RelationalBackendType,
    /// Database file; defaults to `<data_dir>/symphony.db`.
    pub path: Option<PathBuf>,
}

/// Graph store configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Backend to use.
    pub backend: GraphBackendType,
    /// Database file for the `SQLite` backend; defaults to `<data_dir>/graph.db`.
    pub path: Option<PathBuf>,
    /// Neo4j Bolt URI.
    pub uri: String,
    /// Neo4j user.
    pub user: String,
    /// Neo4j password.
    pub password: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackendType::default(),
            path: None,
            uri: DEFAULT_NEO4J_URI.to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
        }
    }
}

/// Social service settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocialConfig {
    /// Resolve usernames relationally before friendship and genre writes,
    /// failing with `NotFound` instead of silently writing nothing.
    pub verify_users: bool,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self { verify_users: true }
    }
}

/// Logging section as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `symphony=debug`.
    pub filter: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Relational store section.
    pub relational: Option<ConfigFileRelational>,
    /// Graph store section.
    pub graph: Option<ConfigFileGraph>,
    /// Social section.
    pub social: Option<ConfigFileSocial>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Relational section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRelational {
    /// Backend name.
    pub backend: Option<String>,
    /// Database file.
    pub path: Option<String>,
}

/// Graph section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileGraph {
    /// Backend name.
    pub backend: Option<String>,
    /// Database file.
    pub path: Option<String>,
    /// Neo4j URI.
    pub uri: Option<String>,
    /// Neo4j user.
    pub user: Option<String>,
    /// Neo4j password.
    pub password: Option<String>,
}

/// Social section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSocial {
    /// Verify users before graph writes.
    pub verify_users: Option<bool>,
}

impl Default for SymphonyConfig {
    fn default() -> Self {
        Self {
            data_dir: crate::storage::default_data_dir(),
            relational: RelationalConfig::default(),
            graph: GraphConfig::default(),
            social: SocialConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl SymphonyConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::operation("read_config_file", e))?;
        Self::parse(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn parse(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| crate::Error::operation("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Returns the default configuration if no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed.
    pub fn load_default() -> crate::Result<Self> {
        Self::default_path().map_or_else(|| Ok(Self::default()), |path| Self::load_if_present(&path))
    }

    /// Loads configuration from `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_if_present(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Platform config file location (`~/.config/symphony/config.toml` on Linux).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.config_dir().join("symphony").join("config.toml"))
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(relational) = file.relational {
            if let Some(backend) = relational.backend {
                config.relational.backend = RelationalBackendType::parse(&backend);
            }
            config.relational.path = relational.path.map(PathBuf::from);
        }
        if let Some(graph) = file.graph {
            if let Some(backend) = graph.backend {
                config.graph.backend = GraphBackendType::parse(&backend);
            }
            config.graph.path = graph.path.map(PathBuf::from);
            if let Some(uri) = graph.uri {
                config.graph.uri = uri;
            }
            if let Some(user) = graph.user {
                config.graph.user = user;
            }
            if let Some(password) = graph.password {
                config.graph.password = password;
            }
        }
        if let Some(verify) = file.social.and_then(|s| s.verify_users) {
            config.social.verify_users = verify;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Pass `|key| std::env::var(key).ok()` for the process environment.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("SYMPHONY_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(uri) = non_empty("NEO4J_HOST") {
            self.graph.uri = uri;
        }
        if let Some(user) = non_empty("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = non_empty("NEO4J_PASSWORD") {
            self.graph.password = password;
        }
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Relational database file.
    #[must_use]
    pub fn relational_path(&self) -> PathBuf {
        self.relational
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("symphony.db"))
    }

    /// Graph database file for the `SQLite` graph backend.
    #[must_use]
    pub fn graph_path(&self) -> PathBuf {
        self.graph
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("graph.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = SymphonyConfig::new().with_data_dir("/tmp/symphony");
        assert_eq!(config.relational.backend, RelationalBackendType::Sqlite);
        assert_eq!(config.graph.backend, GraphBackendType::Sqlite);
        assert!(config.social.verify_users);
        assert_eq!(config.relational_path(), PathBuf::from("/tmp/symphony/symphony.db"));
        assert_eq!(config.graph_path(), PathBuf::from("/tmp/symphony/graph.db"));
        assert_eq!(config.graph.uri, DEFAULT_NEO4J_URI);
    }

    #[test]
    fn test_parse_full_file() {
        let config = SymphonyConfig::parse(
            r#"
            data_dir = "/var/lib/symphony"

            [relational]
            backend = "memory"

            [graph]
            backend = "neo4j"
            uri = "bolt://graph:7687"
            user = "admin"

            [social]
            verify_users = false

            [logging]
            filter = "symphony=debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/symphony"));
        assert_eq!(config.relational.backend, RelationalBackendType::Memory);
        assert_eq!(config.graph.backend, GraphBackendType::Neo4j);
        assert_eq!(config.graph.uri, "bolt://graph:7687");
        assert_eq!(config.graph.user, "admin");
        assert_eq!(config.graph.password, "neo4j");
        assert!(!config.social.verify_users);
        assert_eq!(config.logging.filter.as_deref(), Some("symphony=debug"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = SymphonyConfig::parse("[graph\nbackend=").unwrap_err();
        assert!(err.to_string().contains("parse_config_file"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[graph]\npath = \"/data/g.db\"\n").unwrap();

        let config = SymphonyConfig::load_from_file(&path).unwrap();
        assert_eq!(config.graph_path(), PathBuf::from("/data/g.db"));
    }

    #[test]
    fn test_load_if_present_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SymphonyConfig::load_if_present(&dir.path().join("config.toml")).unwrap();
        let defaults = SymphonyConfig::default();
        assert_eq!(config.data_dir, defaults.data_dir);
        assert_eq!(config.graph_path(), defaults.graph_path());
        assert!(config.social.verify_users);
    }

    #[test]
    fn test_load_if_present_reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[graph\nbackend=").unwrap();

        let err = SymphonyConfig::load_if_present(&path).unwrap_err();
        assert!(err.to_string().contains("parse_config_file"), "{err}");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SYMPHONY_DATA_DIR", "/srv/symphony"),
            ("NEO4J_HOST", "neo4j://cluster:7687"),
            ("NEO4J_PASSWORD", "secret"),
            ("NEO4J_USER", "  "),
        ]);
        let config = SymphonyConfig::new()
            .with_env_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/srv/symphony"));
        assert_eq!(config.graph.uri, "neo4j://cluster:7687");
        assert_eq!(config.graph.password, "secret");
        assert_eq!(config.graph.user, "neo4j");
    }

    #[test_case("memory", GraphBackendType::Memory ; "memory")]
    #[test_case("NEO4J", GraphBackendType::Neo4j ; "neo4j uppercase")]
    #[test_case("sqlite", GraphBackendType::Sqlite ; "sqlite")]
    #[test_case("unknown", GraphBackendType::Sqlite ; "fallback")]
    fn test_graph_backend_parse(name: &str, expected: GraphBackendType) {
        assert_eq!(GraphBackendType::parse(name), expected);
    }
}
