use crate::config::LoggingConfig;
use color_eyre::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Logs go to a daily file because the terminal belongs to the UI. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init(config: &LoggingConfig, directory: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(directory)?;

    let appender = tracing_appender::rolling::daily(directory, "mood-journal.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(guard)
}
