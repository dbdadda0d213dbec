//! Error types for the Ladle transcription pipeline.
//!
//! Errors are organized by stage so that messages carry the file path and
//! the specific issue. The two recognised conversion failures, a missing
//! title and an output name collision, are separate variants.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Ladle operations.
#[derive(Error, Debug)]
pub enum LadleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// No API key could be resolved for the model provider
    #[error("{provider} API key not found. Set {hint} or run `ladle config set-key`.")]
    MissingApiKey { provider: String, hint: String },
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Reading the source image failed
    #[error("Read error for {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Model request failed
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// The request never got an HTTP response (refused, reset, timed out)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// The model response has no usable `<h1>` title
    #[error("No <h1> title found in model response for {path}")]
    TitleNotFound { path: PathBuf },

    /// An HTML file with the derived name already exists
    #[error("Output file already exists: {path}")]
    Collision { path: PathBuf },

    /// Writing the HTML output failed
    #[error("Write error for {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Moving the source image to the trouble directory failed
    #[error("Failed to move {path} to trouble directory: {message}")]
    Move { path: PathBuf, message: String },
}

impl PipelineError {
    /// Whether this failure sends the source image to the trouble directory.
    ///
    /// Everything else (network, HTTP, filesystem) is returned to the batch
    /// driver as a hard error.
    pub fn is_trouble(&self) -> bool {
        matches!(
            self,
            PipelineError::TitleNotFound { .. }
                | PipelineError::Collision { .. }
                | PipelineError::FileTooLarge { .. }
                | PipelineError::UnsupportedFormat { .. }
        )
    }
}

/// Convenience type alias for Ladle results.
pub type Result<T> = std::result::Result<T, LadleError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
