use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{
    error::LoggerResult,
    filter::LogFilter,
    format::LogFormat,
};

/// Environment variable that overrides the configured filter.
pub const FILTER_ENV: &str = "PYLON_LOG";

/// Logger configuration. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LogFormat,
    pub filter: LogFilter,
    /// Include the event target (module path).
    pub with_targets: bool,
    /// Colored text output; only applied when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: LogFilter::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }

    /// Replace the filter with `PYLON_LOG` when it is set and non-empty.
    pub fn with_env_override(self) -> LoggerResult<Self> {
        self.with_filter_override(std::env::var(FILTER_ENV).ok())
    }

    fn with_filter_override(mut self, value: Option<String>) -> LoggerResult<Self> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.filter = value.parse()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoggerError;

    #[test]
    fn defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.filter.as_str(), "info");
        assert!(config.with_targets);
        assert!(config.use_color);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LoggerConfig =
            serde_json::from_str(r#"{"format": "json", "filter": "pylon_core=debug,info"}"#)
                .unwrap();

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter.as_str(), "pylon_core=debug,info");
        assert!(config.with_targets);
    }

    #[test]
    fn invalid_filter_fails_deserialization() {
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"filter": "x=maybe"}"#).is_err());
    }

    #[test]
    fn filter_override() {
        let config = LoggerConfig::default()
            .with_filter_override(Some("debug".into()))
            .unwrap();
        assert_eq!(config.filter.as_str(), "debug");

        let config = LoggerConfig::default()
            .with_filter_override(Some("  ".into()))
            .unwrap();
        assert_eq!(config.filter.as_str(), "info");

        let err = LoggerConfig::default()
            .with_filter_override(Some("x=maybe".into()))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFilter { .. }));
    }
}
