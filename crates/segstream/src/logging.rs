//! Log setup: one timestamped file per run plus stdout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_FORMAT: &str = "logfile_%Y-%m-%d_%H-%M-%S.log";

/// Flushes the file writer when dropped; keep it alive for the whole run.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    pub path: PathBuf,
}

pub fn log_file_name(started: DateTime<Local>) -> String {
    started.format(LOG_FILE_FORMAT).to_string()
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(log_dir: &Path) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let file_name = log_file_name(Local::now());
    let path = log_dir.join(&file_name);

    let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}
