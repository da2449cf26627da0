//! Configuration structures.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration. Unknown keys are rejected so that typos do not go unnoticed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::top_actor::TopActorPolicy;

/// Settings for [`crate::logging::init_logging`].
///
/// ```
/// use novade_compositor_stack::config::LoggingConfig;
///
/// let config: LoggingConfig = toml::from_str(r#"level = "debug""#).unwrap();
/// assert_eq!(config.level, "debug");
/// assert_eq!(config.format, "text");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of "trace", "debug", "info", "warn", "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Daily-rolling log file. `None` disables file logging.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Root configuration of the stacking subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
    /// Which actor counts as the top actor.
    #[serde(default)]
    pub top_actor: TopActorPolicy,
    /// How many diagnostics are kept before the oldest are evicted.
    #[serde(default = "defaults::default_diagnostics_capacity")]
    pub diagnostics_capacity: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            logging: defaults::default_logging_config(),
            top_actor: TopActorPolicy::default(),
            diagnostics_capacity: defaults::default_diagnostics_capacity(),
        }
    }
}
