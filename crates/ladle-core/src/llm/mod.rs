//! LLM integration for recipe transcription.
//!
//! Provides a provider abstraction with a Gemini backend, plus retry
//! helpers used by the processor around each call.

pub(crate) mod gemini;
pub mod provider;
pub(crate) mod retry;

pub use provider::{
    create_provider, ImageInput, LlmProvider, LlmRequest, LlmResponse, RECIPE_PROMPT,
};
