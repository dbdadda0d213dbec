//! Ladle CLI - transcribe recipe photos into HTML pages.
//!
//! Ladle sends each recipe image to a multimodal model, names the returned
//! HTML after its `<h1>` title, and moves images it cannot convert into a
//! trouble directory.
//!
//! # Usage
//!
//! ```bash
//! # Process the configured raw directory (data/raw by default)
//! ladle process
//!
//! # Process another directory with custom destinations
//! ladle process ./scans --output-dir ./recipes --trouble-dir ./scans/trouble
//!
//! # Store the API key in the config file
//! ladle config set-key <KEY>
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Ladle - transcribe recipe photos into HTML pages.
#[derive(Parser, Debug)]
#[command(name = "ladle")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Append logs to this file (overrides logging.file)
    #[arg(long, global = true, env = "LADLE_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcribe recipe images into HTML files
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = ladle_core::Config::load();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let log_config = match &loaded {
        Ok(config) => config.clone(),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Logging with default settings. Check your config file with `ladle config path`."
            );
            ladle_core::Config::default()
        }
    };
    let _log_guard = logging::init_from_config(
        &log_config,
        cli.verbose,
        cli.json_logs,
        cli.log_file.as_deref(),
    );

    tracing::debug!("Ladle v{}", ladle_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, loaded?).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
