//! Log destination setup: stdout by default, an append-mode file when asked

use std::fs::OpenOptions;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::{HookError, Result};

/// Install the global tracing subscriber.
///
/// `destination` of `None` or `"-"` logs to stdout. Anything else is
/// treated as a file path, opened in append mode and written through a
/// non-blocking worker; the returned guard must stay alive until process
/// exit so buffered lines are flushed.
pub fn init(destination: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match destination {
        None | Some("") | Some("-") => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
        Some(path) => {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|e| {
                    HookError::Config(format!("cannot open log file '{}': {}", path, e))
                })?;

            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();

            Ok(Some(guard))
        }
    }
}
