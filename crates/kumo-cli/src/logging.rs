//! Structured logging on stderr.
//!
//! Results and plans go to stdout or an output file, so log records are
//! written to stderr. Records emitted by the engine through the `log` facade
//! are forwarded into tracing by the subscriber's log bridge.

use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

fn filter_from_config(config: &CliConfig) -> EnvFilter {
    EnvFilter::new(config.log_level.as_filter_str())
}

/// Initialise the logging subsystem based on configuration.
///
/// Log level precedence (highest to lowest):
///
/// 1. CLI `--log-level`
/// 2. `KUMO_LOG_LEVEL`
/// 3. `info`
///
/// If a global subscriber is already set the call is ignored; the first
/// subscriber wins.
pub fn init_logging(config: &CliConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn init_logging_is_idempotent() {
        let config = CliConfig::default();
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn filter_uses_config_log_level() {
        let config = CliConfig::default().apply_overrides(Some(LogLevel::Debug));
        assert_eq!(filter_from_config(&config).to_string(), "debug");
    }
}
