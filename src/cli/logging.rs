//! Subscriber setup for the binary

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives applied when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn";

/// File name of the log for one run of `command`
pub fn log_file_name(command: &str) -> String {
    format!(
        "{command}_{}.log",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Install the global subscriber
///
/// The console layer is only added with `verbose`; otherwise the terminal
/// belongs to the progress spinner. Returns the log file path, if any.
pub fn init_logging(
    config: &LoggingConfig,
    command: &str,
    verbose: bool,
) -> Result<Option<PathBuf>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    let mut log_path = None;
    let file_layer = if config.file {
        fs::create_dir_all(&config.directory)?;
        let file_name = log_file_name(command);
        log_path = Some(config.directory.join(&file_name));
        let appender = tracing_appender::rolling::never(&config.directory, file_name);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(appender)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialise logging: {e}")))?;

    if let Some(path) = &log_path {
        info!("Log file: {}", path.display());
    }
    Ok(log_path)
}
