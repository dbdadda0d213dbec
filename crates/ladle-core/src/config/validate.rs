//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.raw_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "paths.raw_dir must not be empty".into(),
            ));
        }
        if self.paths.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "paths.output_dir must not be empty".into(),
            ));
        }
        if self.paths.trouble_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "paths.trouble_dir must not be empty".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must list at least one extension".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        let gemini = &self.llm.gemini;
        if gemini.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.gemini.model must not be empty".into(),
            ));
        }
        if !(0.0..=2.0).contains(&gemini.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.gemini.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if gemini.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.gemini.max_output_tokens must be > 0".into(),
            ));
        }
        Ok(())
    }
}
