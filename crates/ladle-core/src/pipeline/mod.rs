//! Recipe transcription pipeline components.
//!
//! - **discovery**: Find recipe images in the raw directory
//! - **loader**: Read image bytes, with size and format checks
//! - **title**: Strip code fences and pull the `<h1>` title
//! - **router**: Write HTML output or move images to the trouble directory
//! - **processor**: Orchestrates the per-image pipeline

pub mod discovery;
pub mod loader;
pub mod processor;
pub mod router;
pub mod title;

// Re-exports for convenient access
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use loader::{ImageLoader, LoadedImage};
pub use processor::{ProcessOptions, RecipeProcessor};
pub use router::FileRouter;
pub use title::{extract_title, parse_recipe, strip_fences};
