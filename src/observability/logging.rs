//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from config settings, then applies
    /// `SYMPHONY_LOG_FILTER`, `SYMPHONY_LOG_FORMAT` and `SYMPHONY_LOG_FILE`
    /// read through `lookup`.
    ///
    /// `verbose` only changes the default filter; an explicit filter wins.
    #[must_use]
    pub fn from_settings(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let default_filter = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
        let mut config = Self {
            filter: settings
                .and_then(|s| s.filter.clone())
                .unwrap_or_else(|| default_filter.to_string()),
            format: settings
                .and_then(|s| s.format.as_deref())
                .map(LogFormat::parse)
                .unwrap_or_default(),
            file: settings.and_then(|s| s.file.clone()),
        };

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(filter) = non_empty("SYMPHONY_LOG_FILTER") {
            config.filter = filter;
        }
        if let Some(format) = non_empty("SYMPHONY_LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        if let Some(file) = non_empty("SYMPHONY_LOG_FILE") {
            config.file = Some(PathBuf::from(file));
        }
        config
    }
}
