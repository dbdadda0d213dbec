//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats, plus an appending log file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `verbose` - If true, enables DEBUG level logging; otherwise INFO level.
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
/// * `log_file` - Optional file that every event is appended to (no ANSI).
///
/// # Notes
///
/// - Console output goes to stderr so it does not mix with the progress bar
/// - The RUST_LOG environment variable can override the log level
/// - The returned guard must be held until exit so the file writer flushes
pub fn init(verbose: bool, json_format: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Build the filter, respecting RUST_LOG if set
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_writer, guard) = match log_file.and_then(open_appender) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file_writer.map(|w| fmt::layer().json().with_writer(w)))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .init();
    }

    guard
}

/// Initialize logging with configuration from Config.
///
/// CLI flags override the config file.
pub fn init_from_config(
    config: &ladle_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
    log_file_override: Option<&Path>,
) -> Option<WorkerGuard> {
    let verbose =
        verbose_override || config.logging.level == "debug" || config.logging.level == "trace";
    let json_format = json_logs_override || config.logging.format == "json";
    let config_file = config.log_file();
    let log_file = log_file_override.or(config_file.as_deref());
    init(verbose, json_format, log_file)
}

/// Open `path` for appending through a never-rotating appender.
fn open_appender(path: &Path) -> Option<tracing_appender::rolling::RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name()?;

    // Logging isn't up yet, so report problems on stderr directly.
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: cannot create log directory {}: {e}", dir.display());
        return None;
    }
    Some(tracing_appender::rolling::never(dir, file_name))
}
