//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "GRIDWIDGET_LOG";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/gridwidget/logs/`. Stdout carries the
/// host protocol, so nothing is ever logged there.
/// Log level is controlled by the `GRIDWIDGET_LOG` environment variable.
///
/// # Examples
/// ```bash
/// GRIDWIDGET_LOG=debug gridwidget --kind nad
/// GRIDWIDGET_LOG=gridwidget_app=trace gridwidget
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "gridwidget.log");

    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("gridwidget=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::LoggingInit(e.to_string()))?;

    tracing::info!("gridwidget host bridge starting");
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("gridwidget").join("logs"))
}
