//! The `ladle config` command for configuration management.

use clap::{Args, Subcommand};
use ladle_core::Config;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Store the Gemini API key in the config file
    SetKey {
        /// API key, or a ${ENV_VAR} reference
        key: String,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            let toml = config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            let path = Config::default_path();
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let config = Config::default();
            let toml = config.to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::SetKey { key } => {
            let path = Config::default_path();
            save_api_key(&path, &key)?;
            println!("Gemini API key saved to {}", path.display());
        }
    }

    Ok(())
}

/// Write `llm.gemini.api_key` into the config file, keeping comments and
/// every other setting intact. Creates the file if needed.
pub fn save_api_key(path: &Path, key: &str) -> anyhow::Result<()> {
    if key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc: toml_edit::DocumentMut = content.parse()?;

    let llm = doc
        .entry("llm")
        .or_insert_with(toml_edit::table)
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("`llm` in {} is not a table", path.display()))?;
    llm.set_implicit(true);
    let gemini = llm
        .entry("gemini")
        .or_insert_with(toml_edit::table)
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("`llm.gemini` in {} is not a table", path.display()))?;
    gemini["api_key"] = toml_edit::value(key);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())?;
    tracing::debug!("Stored Gemini API key in {}", path.display());
    Ok(())
}
