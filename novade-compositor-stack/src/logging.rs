// novade-compositor-stack/src/logging.rs
//! Logging setup for the stacking subsystem.
//!
//! Embedders that already install a `tracing` subscriber need none of this;
//! the crate only emits events. Standalone tools and tests use
//! [`init_minimal_logging`], compositors driven by a [`LoggingConfig`] use
//! [`init_logging`].

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::StackError;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Logs to `stderr`, filtered by `RUST_LOG` (default `info`).
///
/// Errors (a subscriber is already installed) are ignored.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn parse_level(level: &str) -> Result<Level, StackError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        invalid => Err(StackError::LoggingInitialization(format!(
            "Invalid log level in config: {}",
            invalid
        ))),
    }
}

/// Daily-rolling file layer writing through a non-blocking appender.
fn create_file_layer(log_path: &Path, format: &str) -> Result<(BoxedLayer, WorkerGuard), StackError> {
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory).map_err(|e| {
        StackError::LoggingInitialization(format!(
            "Failed to create log directory {}: {}",
            directory.display(),
            e
        ))
    })?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| StackError::LoggingInitialization(format!("Log path has no file name: {}", log_path.display())))?;

    let appender = tracing_appender::rolling::daily(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = match format.to_lowercase().as_str() {
        "json" => fmt::layer().json().with_writer(writer).with_ansi(false).boxed(),
        _ => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
    };
    Ok((layer, guard))
}

/// Keeps the file appender's worker alive so buffered lines get flushed.
static LOG_WORKER_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Installs the global subscriber described by `config`: a stdout layer and,
/// if `file_path` is set, a rolling file layer in the same format.
///
/// # Errors
///
/// [`StackError::LoggingInitialization`] for an invalid level, an unusable
/// log path, or when a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), StackError> {
    let level = parse_level(&config.level)?;

    let stdout_layer: BoxedLayer = match config.format.to_lowercase().as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_ansi(false)
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed(),
        _ => fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(std::io::stdout().is_terminal())
            .with_filter(EnvFilter::new(level.to_string()))
            .boxed(),
    };

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer];
    let mut file_guard = None;
    if let Some(log_path) = &config.file_path {
        let (file_layer, guard) = create_file_layer(log_path, &config.format)?;
        layers.push(file_layer.with_filter(EnvFilter::new(level.to_string())).boxed());
        file_guard = Some(guard);
    }

    Registry::default().with(layers).try_init().map_err(|e| {
        StackError::LoggingInitialization(format!(
            "Failed to set global tracing subscriber. Was it already initialized? Error: {}",
            e
        ))
    })?;

    match LOG_WORKER_GUARD.lock() {
        Ok(mut slot) => *slot = file_guard,
        Err(e) => eprintln!("[ERROR] Failed to store log worker guard: {}. Log flushing may be affected.", e),
    }
    tracing::info!(level = %level, format = %config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_accepts_any_case() {
        assert_eq!(parse_level("WARN").unwrap(), Level::WARN);
        assert_eq!(parse_level("trace").unwrap(), Level::TRACE);
    }

    #[test]
    fn test_invalid_level_is_rejected_before_install() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            ..LoggingConfig::default()
        };
        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, StackError::LoggingInitialization(msg) if msg.contains("chatty")));
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("stack.log");
        let (_layer, _guard) = create_file_layer(&path, "json").unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_minimal_logging_is_idempotent() {
        init_minimal_logging();
        init_minimal_logging();
    }
}
