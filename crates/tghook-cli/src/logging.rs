//! Logging setup
//!
//! Always logs to stderr. With a log directory configured, also writes a
//! daily file and removes files older than 7 days.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const LOG_RETENTION_DAYS: u64 = 7;
const LOG_PREFIX: &str = "tghook";

fn current_log_path(log_dir: &Path) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    log_dir.join(format!("{}.{}.log", LOG_PREFIX, today))
}

fn is_own_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(LOG_PREFIX) && n.ends_with(".log"))
}

/// Removes our log files last modified before the retention window.
fn cleanup_old_logs(log_dir: &Path) -> Result<usize> {
    let cutoff = SystemTime::now() - Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);
    let mut deleted_count = 0;
    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_own_log(&path) || fs::metadata(&path)?.modified()? >= cutoff {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => deleted_count += 1,
            Err(e) => eprintln!("Failed to delete old log {}: {}", path.display(), e),
        }
    }
    Ok(deleted_count)
}

pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

pub fn init_logging(log_dir: Option<&Path>, log_level: &str) -> Result<LoggingGuard> {
    let mut guard = None;
    let mut deleted_count = 0;

    let file_layer = match log_dir {
        Some(log_dir) => {
            fs::create_dir_all(log_dir)?;
            deleted_count = cleanup_old_logs(log_dir)?;

            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(current_log_path(log_dir))?;
            let (non_blocking, worker_guard) = tracing_appender::non_blocking(file);
            guard = Some(worker_guard);

            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(env_filter(log_level)),
            )
        }
        None => None,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_filter(env_filter(log_level));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    if deleted_count > 0 {
        tracing::info!("Cleaned up {} old log file(s)", deleted_count);
    }

    Ok(LoggingGuard { _guard: guard })
}
