use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize file-only logging.
///
/// Logs roll daily under the app data directory. Returns a `WorkerGuard`
/// that must be kept alive for the duration of the application so buffered
/// logs are flushed on shutdown.
pub fn init() -> WorkerGuard {
    let log_dir = dirs::data_dir()
        .map(|d| d.join("docchat").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "docchat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter);

    // No stdout layer; the TUI owns the terminal
    tracing_subscriber::registry().with(file_layer).init();

    guard
}
