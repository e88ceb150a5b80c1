//! Front end configuration parsed from environment variables.
//!
//! Only settings owned by the binary live here. Engine settings are read by
//! [`kumo::config::EngineConfig`] from `KUMO_*` variables and the command
//! line flags layered on top of them.

use std::env;
use std::str::FromStr;

use crate::error::CliError;

/// Environment variable holding the default log level.
pub const LOG_LEVEL_VAR: &str = "KUMO_LOG_LEVEL";

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Debug-level information, including per-step matching.
    Debug,
    /// Standard informational messages.
    #[default]
    Info,
    /// Warning messages, such as failed tear-down hooks.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(CliError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub const fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Configuration of the binary itself.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: LogLevel,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidConfig`] if `KUMO_LOG_LEVEL` holds an
    /// unknown level.
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_log_level(env::var(LOG_LEVEL_VAR).ok().as_deref())
    }

    fn from_log_level(value: Option<&str>) -> Result<Self, CliError> {
        let log_level = match value {
            Some(value) => value.parse()?,
            None => LogLevel::default(),
        };
        Ok(Self { log_level })
    }

    /// Apply command line overrides on top of environment values.
    #[must_use]
    pub fn apply_overrides(mut self, log_level: Option<LogLevel>) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("Debug", LogLevel::Debug)]
    #[case("INFO", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case(" error ", LogLevel::Error)]
    fn log_level_parses_valid_values(#[case] text: &str, #[case] expected: LogLevel) {
        assert_eq!(text.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let Err(error) = "loud".parse::<LogLevel>() else {
            panic!("expected an error");
        };
        assert!(error.to_string().contains("unknown log level 'loud'"));
    }

    #[test]
    fn missing_variable_defaults_to_info() {
        let config = CliConfig::from_log_level(None).unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn flags_override_the_environment() {
        let config = CliConfig::from_log_level(Some("warn"))
            .unwrap_or_else(|error| panic!("{error}"))
            .apply_overrides(Some(LogLevel::Trace));
        assert_eq!(config.log_level, LogLevel::Trace);

        let config = CliConfig::from_log_level(Some("warn"))
            .unwrap_or_else(|error| panic!("{error}"))
            .apply_overrides(None);
        assert_eq!(config.log_level, LogLevel::Warn);
    }
}
