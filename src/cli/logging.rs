//! Tracing setup: compact stderr output plus a per-run log file

use crate::cli::args::VerbosityLevel;
use chrono::{DateTime, Local};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter for the log file unless `RUST_LOG` is set
const FILE_FILTER: &str = "info,embedgrab=debug";

/// `embedgrab_<YYYYmmdd_HHMMSS>.log`
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("embedgrab_{}.log", now.format("%Y%m%d_%H%M%S"))
}

/// Non-blocking writer for a fresh log file in `log_dir`. Lines are
/// flushed until the guard is dropped.
pub fn file_writer(log_dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, log_file_name(Local::now()));
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// rest of `main`, or buffered file lines are lost.
pub fn init_logging(verbosity: VerbosityLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "info",
        VerbosityLevel::Verbose => "debug",
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir.map(file_writer) {
        Some(Ok((writer, guard))) => {
            let file_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(FILE_FILTER));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("Log file disabled: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
                .with_filter(console_filter),
        )
        .with(file_layer)
        .try_init()
        .ok();

    guard
}
