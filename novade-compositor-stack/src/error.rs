// novade-compositor-stack/src/error.rs
//! Error types for the stacking subsystem.
//!
//! Almost nothing in this crate is allowed to fail loudly: a compositor crash
//! takes the whole session down with it. The narrow APIs that *can* refuse a
//! request (registering a second actor for a window, loading configuration,
//! installing the logger) return [`StackError`]; the [`crate::Compositor`]
//! turns those refusals into [`crate::Diagnostic`] records and carries on.

use std::path::PathBuf;
use thiserror::Error;

use crate::actor::ActorId;
use crate::window::WindowId;

/// Errors raised by the stacking subsystem.
#[derive(Debug, Error)]
pub enum StackError {
    /// A second actor was requested for a window that already has one.
    #[error("Window {0} already has a window actor")]
    DuplicateActor(WindowId),

    /// The referenced actor is not (or no longer) registered.
    #[error("Unknown window actor: {0}")]
    UnknownActor(ActorId),

    /// Configuration could not be read, parsed or validated.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// The global tracing subscriber could not be installed.
    #[error("Logging Initialization Failed: {0}")]
    LoggingInitialization(String),
}

/// Errors raised while loading a [`crate::config::StackConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The values parsed but are not acceptable.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Result alias used throughout the crate.
pub type Result<T, E = StackError> = std::result::Result<T, E>;
