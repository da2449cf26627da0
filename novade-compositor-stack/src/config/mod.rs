//! Configuration of the stacking subsystem.
//!
//! The configuration is a small TOML document:
//!
//! ```toml
//! top_actor = "covers_output"   # or "overlaps_output"
//! diagnostics_capacity = 256
//!
//! [logging]
//! level = "info"
//! format = "text"
//! file_path = "/var/log/novade/compositor.log"
//! ```
//!
//! [`StackConfig::from_toml_str`] and [`StackConfig::load`] parse and then
//! [`StackConfig::validate`], which normalizes the logging values to lower
//! case and rejects anything it does not understand.

pub mod defaults;
pub mod types;

use std::fs;
use std::path::Path;

use tracing::debug;

pub use types::{LoggingConfig, StackConfig};

use crate::error::ConfigError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

impl StackConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: StackConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Loaded stacking configuration");
        Ok(config)
    }

    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.logging.level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        self.logging.format = self.logging.format.to_lowercase();
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }

        if self.diagnostics_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "diagnostics_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
