//! Tracing subscriber setup.

use crate::utils::config::{LogFormat, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Console output goes to stderr so CLI commands keep stdout for results.
/// `RUST_LOG` wins over `logging.level` when set. When `logging.file` is
/// configured, a second non-blocking layer writes plain-text lines to that
/// file; the returned guard must be held until shutdown or buffered lines are
/// lost.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (file_layer, guard) = match config.file.as_deref().and_then(file_writer) {
        Some((writer, guard)) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer)
                    .boxed(),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    if result.is_err() {
        // A subscriber is already installed (tests, embedding)
        return guard;
    }

    if let Some(path) = &config.file {
        tracing::info!(path = %path.display(), "File logging enabled");
    }

    guard
}

fn file_writer(
    path: &Path,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name()?;

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Cannot create log directory {}: {}", dir.display(), e);
        return None;
    }

    let appender = tracing_appender::rolling::never(dir, file_name);
    Some(tracing_appender::non_blocking(appender))
}
