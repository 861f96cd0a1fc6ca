//! Stderr logging for the CLI.
//!
//! Level precedence: `--config-override log_level=...`, then `TASKLIST_LOG`,
//! then the config file, then `warn`.

use flexi_logger::{Logger, LoggerHandle};
use tasklist_core::config::{Config, ConfigOverrides, normalize_log_level};
use tasklist_core::error::AppError;

pub const LOG_ENV_VAR: &str = "TASKLIST_LOG";

pub fn resolve_level(
    overrides: &ConfigOverrides,
    env_level: Option<&str>,
    config: &Config,
) -> &'static str {
    overrides
        .log_level
        .as_deref()
        .and_then(normalize_log_level)
        .or_else(|| env_level.and_then(normalize_log_level))
        .unwrap_or_else(|| config.log_level())
}

/// Starts the logger. The returned handle must be kept alive for as long as
/// logging is wanted.
pub fn init_logging(level: &str) -> Result<LoggerHandle, AppError> {
    Logger::try_with_str(level)
        .map_err(|err| AppError::invalid_data(format!("invalid log level `{level}`: {err}")))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| AppError::io(format!("failed to start logger: {err}")))
}
