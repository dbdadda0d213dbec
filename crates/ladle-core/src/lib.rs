//! Ladle Core - recipe image to HTML transcription library.
//!
//! Ladle reads photos or scans of recipes, asks a multimodal model to copy
//! each one into HTML, names the result after its `<h1>` title and parks
//! anything it cannot convert in a trouble directory.
//!
//! # Architecture
//!
//! ```text
//! Image → Load → Gemini (image + prompt) → Strip fences → <h1> title → <title>.html
//!                                                       ↘ no title / name taken → trouble/
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ladle_core::{create_provider, Config, RecipeProcessor};
//!
//! #[tokio::main]
//! async fn main() -> ladle_core::Result<()> {
//!     let config = Config::load()?;
//!     let api_key = config.gemini_api_key()?;
//!     let provider = create_provider(&config.llm, &api_key, None)?;
//!     let processor = RecipeProcessor::from_config(&config, provider);
//!
//!     let outcome = processor.process("./data/raw/recipe1.PNG".as_ref()).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, LadleError, PipelineError, PipelineResult, Result};
pub use llm::{create_provider, LlmProvider};
pub use pipeline::{DiscoveredFile, FileDiscovery, FileRouter, ProcessOptions, RecipeProcessor};
pub use types::{BatchStats, Outcome, Recipe};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
