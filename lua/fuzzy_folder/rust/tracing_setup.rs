use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Sends `tracing` output to `log_file` through a background writer.
///
/// `level` is an `EnvFilter` directive such as `"debug"` or
/// `"fuzzy_folder_nvim=trace"`. Only the first call installs a subscriber;
/// later calls return the path without touching it.
pub fn init_tracing(log_file: &str, level: Option<&str>) -> Result<String> {
    if LOG_GUARD.get().is_some() {
        return Ok(log_file.to_string());
    }

    let path = Path::new(log_file);
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidPath(log_file.to_string()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory).map_err(|e| Error::io("log directory", e))?;

    let filter = EnvFilter::try_new(level.unwrap_or("info"))
        .map_err(|e| Error::InvalidConfig(format!("invalid log level: {e}")))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_names(true),
    );

    if subscriber.try_init().is_err() {
        // Someone else owns the global subscriber; the guard would only flush nothing.
        return Ok(log_file.to_string());
    }

    if LOG_GUARD.set(guard).is_err() {
        // The rejected guard is dropped here, which stops its writer thread.
        tracing::warn!("Log writer guard was already set, file logging may stop");
    }
    tracing::info!("fuzzy-folder logging to {}", log_file);
    Ok(log_file.to_string())
}
