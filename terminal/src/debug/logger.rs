//! Subscriber initialization

use super::config::{LogConfig, DEFAULT_LOG_FILTER};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "terminal.log";

/// Initialize the logging system
///
/// Sets up:
/// - Filter from `RUST_LOG`, then `config.log_level`, then [`DEFAULT_LOG_FILTER`]
/// - Human-readable or JSON output on stderr
/// - Daily-rotated file in `config.log_dir`, written through a non-blocking worker
///
/// Returns the file writer's guard; keep it alive for the lifetime of the program or
/// buffered lines are lost. A second call leaves the installed subscriber in place and
/// returns `None`.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => match fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false); // No ANSI codes in log files
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log directory {}: {}", dir.display(), e);
                (None, None)
            }
        },
        None => (None, None),
    };

    let (text_layer, json_layer) = if config.json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr).with_target(true)), None)
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => {
            tracing::info!(
                log_level = %config.log_level,
                log_dir = ?config.log_dir,
                json = config.json,
                "Logging initialized"
            );
            guard
        }
        Err(_) => None,
    }
}
