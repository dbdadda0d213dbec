//! Configuration management for Ladle.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file only
//! overrides what it names.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::llm::provider::resolve_env_var;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Ladle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input, output and trouble directories
    pub paths: PathsConfig,

    /// File discovery settings
    pub processing: ProcessingConfig,

    /// Retry settings
    pub pipeline: PipelineConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// LLM provider settings
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.ladle.ladle/config.toml
    /// - Linux: ~/.config/ladle/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\ladle\config\config.toml
    ///
    /// Falls back to ~/.ladle/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "ladle", "ladle")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".ladle").join("config.toml")
            })
    }

    /// Resolved raw image directory (with ~ expansion).
    pub fn raw_dir(&self) -> PathBuf {
        expand(&self.paths.raw_dir)
    }

    /// Resolved HTML output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.paths.output_dir)
    }

    /// Resolved trouble directory (with ~ expansion).
    pub fn trouble_dir(&self) -> PathBuf {
        expand(&self.paths.trouble_dir)
    }

    /// Resolved log file path, or `None` when file logging is disabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        if self.logging.file.trim().is_empty() {
            return None;
        }
        Some(PathBuf::from(
            shellexpand::tilde(&self.logging.file).into_owned(),
        ))
    }

    /// Resolve the Gemini API key, failing if none is configured.
    ///
    /// Called once at startup so a missing credential stops the run before
    /// any image is touched.
    pub fn gemini_api_key(&self) -> Result<String, ConfigError> {
        resolve_env_var(&self.llm.gemini.api_key).ok_or_else(|| ConfigError::MissingApiKey {
            provider: "Gemini".to_string(),
            hint: env_var_hint(&self.llm.gemini.api_key)
                .unwrap_or("GEMINI_API_KEY")
                .to_string(),
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

/// Name of the env var in a `${VAR}` reference.
fn env_var_hint(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|v| v.strip_suffix('}'))
}
