//! File-based logging.
//!
//! The interactive shell owns stdout and stderr, so tracing output goes to a
//! daily-rotating file under the configured log directory.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

const LOG_FILE_PREFIX: &str = "encore.log";

/// Build the filter: `RUST_LOG` wins, then `logging.filter`.
pub fn filter_from(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER))
}

/// Install the global subscriber writing to `<log_dir>/encore.log.YYYY-MM-DD`.
///
/// The returned guard flushes buffered lines on drop; keep it alive for the
/// life of the process.
pub fn init(settings: &LoggingSettings, log_dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter_from(settings))
        .with(fmt_layer)
        .try_init();

    tracing::info!(dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}
