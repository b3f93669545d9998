use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt};

const LOG_PREFIX: &str = "apkmass";
const MAX_LOG_FILES: usize = 10;

/// Installs the global subscriber writing to daily rotated files in `logs_dir`.
///
/// `RUST_LOG` overrides the default `debug` level. The returned guard flushes
/// buffered lines when dropped and must live until the program ends.
pub fn setup_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir).context("Failed to create logs directory")?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(logs_dir)
        .context("Failed to initialize file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    // `try_init` also routes `log` records through tracing.
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .event_format(fmt::format().pretty())
        .with_writer(non_blocking)
        .try_init()
        .map_err(|e| anyhow!(e).context("Failed to set global subscriber"))?;
    Ok(guard)
}
