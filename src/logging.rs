// ABOUTME: Tracing setup: writes structured logs to a file since the TUI owns the terminal.
// ABOUTME: RUST_LOG overrides the configured level; the returned guard flushes on drop.

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, LoggingConfig};

/// Keeps the non-blocking writer alive; logs are flushed when this is dropped.
pub struct LogGuard {
    pub path: PathBuf,
    _guard: WorkerGuard,
}

/// Default log file: ~/.aidm/logs/aidm-<timestamp>.log
pub fn default_log_path() -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S");
    Config::logs_dir().join(format!("aidm-{stamp}.log"))
}

/// Build the filter: RUST_LOG when set, otherwise the configured level.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber writing to the configured (or default) file.
pub fn init(config: &LoggingConfig) -> anyhow::Result<LogGuard> {
    let path = config.file.clone().unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file =
        File::create(&path).with_context(|| format!("creating log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(LogGuard {
        path,
        _guard: guard,
    })
}
