//! LLM provider trait and request/response types.
//!
//! Defines the interface a transcription backend implements, plus the
//! constructor that builds one from an explicit config.

use crate::config::LlmConfig;
use crate::error::{ConfigError, PipelineError};
use async_trait::async_trait;
use base64::Engine;

/// Instruction sent alongside every recipe image.
pub const RECIPE_PROMPT: &str = "\
You are a data entry expert for a restaurant. Your job is to accurately and \
completely copy the recipe you are given.
You will be given an image. Convert the image to valid HTML so the recipe can \
be displayed in a browser.
Always return only valid HTML. Put the title of the dish in a single <h1> \
element. Some important things to capture are:
the title of the dish,
the ingredients and their amounts,
the steps taken,
and the appearance of the original (pay attention to indentation).";

/// Base64-encoded image ready to send to an LLM API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "heif" => "image/heif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/png");
                "image/png"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }
}

/// A request to transcribe one image.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The recipe image
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    /// Build a recipe transcription request with the fixed instruction prompt.
    pub fn transcribe_recipe(image: ImageInput) -> Self {
        Self {
            image,
            prompt: RECIPE_PROMPT.to_string(),
            max_tokens: 8192,
            temperature: 0.2,
        }
    }

    /// Override sampling parameters from config.
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

/// The response from a transcription call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text (expected to be HTML, possibly fenced)
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send the image and prompt, returning the generated text.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
    } else if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Create the Gemini provider from config and an already-resolved API key.
///
/// `model_override` replaces the configured model name when given.
pub fn create_provider(
    config: &LlmConfig,
    api_key: &str,
    model_override: Option<&str>,
) -> Result<Box<dyn LlmProvider>, ConfigError> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey {
            provider: "Gemini".to_string(),
            hint: "GEMINI_API_KEY".to_string(),
        });
    }
    let cfg = &config.gemini;
    let model = model_override.unwrap_or(&cfg.model);
    Ok(Box::new(super::gemini::GeminiProvider::new(
        &cfg.endpoint,
        api_key,
        model,
    )))
}
