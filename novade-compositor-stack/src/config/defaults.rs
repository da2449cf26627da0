//! Default configuration values.
//!
//! Referenced from `#[serde(default = "...")]` attributes in [`super::types`].

use std::path::PathBuf;

use super::types::LoggingConfig;

pub(super) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

/// `"info"`.
pub(super) fn default_log_level() -> String {
    "info".to_string()
}

/// No log file.
pub(super) fn default_log_file_path() -> Option<PathBuf> {
    None
}

/// `"text"`.
pub(super) fn default_log_format() -> String {
    "text".to_string()
}

/// Enough to keep a burst of protocol noise from one bad client.
pub(super) fn default_diagnostics_capacity() -> usize {
    256
}
