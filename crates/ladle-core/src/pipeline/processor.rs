//! Per-image pipeline: load, transcribe, extract title, place the result.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::llm::retry;
use crate::types::Outcome;

use super::loader::ImageLoader;
use super::router::FileRouter;
use super::title::parse_recipe;

/// Characters of the model response included in extraction-failure logs.
const RESPONSE_PREVIEW_CHARS: usize = 300;

/// Options controlling each model call.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum retries per image (0 = single attempt)
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum tokens the model may generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            retry_attempts: 0,
            retry_delay_ms: 1000,
            max_tokens: 8192,
            temperature: 0.2,
        }
    }
}

impl ProcessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout_ms: config.limits.llm_timeout_ms,
            retry_attempts: config.pipeline.retry_attempts,
            retry_delay_ms: config.pipeline.retry_delay_ms,
            max_tokens: config.llm.gemini.max_output_tokens,
            temperature: config.llm.gemini.temperature,
        }
    }
}

/// Converts recipe images into HTML files, one at a time.
pub struct RecipeProcessor {
    loader: ImageLoader,
    provider: Arc<dyn LlmProvider>,
    router: FileRouter,
    options: ProcessOptions,
}

impl RecipeProcessor {
    pub fn new(
        loader: ImageLoader,
        provider: Box<dyn LlmProvider>,
        router: FileRouter,
        options: ProcessOptions,
    ) -> Self {
        Self {
            loader,
            provider: Arc::from(provider),
            router,
            options,
        }
    }

    /// Build a processor from config with the given provider.
    pub fn from_config(config: &Config, provider: Box<dyn LlmProvider>) -> Self {
        Self::new(
            ImageLoader::new(config.limits.clone()),
            provider,
            FileRouter::new(config.output_dir(), config.trouble_dir()),
            ProcessOptions::from_config(config),
        )
    }

    pub fn router(&self) -> &FileRouter {
        &self.router
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Process one image to a terminal outcome.
    ///
    /// A missing title, a name collision or an unusable image moves the
    /// source into the trouble directory and yields `Outcome::Trouble`.
    /// Network, HTTP and filesystem errors are returned unchanged and the
    /// source image stays where it is.
    pub async fn process(&self, path: &Path) -> PipelineResult<Outcome> {
        match self.convert(path).await {
            Ok((output, title)) => {
                tracing::info!("Wrote {:?} from {:?}", output, path);
                Ok(Outcome::Written {
                    source: path.to_path_buf(),
                    output,
                    title,
                })
            }
            Err(reason) if reason.is_trouble() => {
                let destination = match self.router.move_to_trouble(path) {
                    Ok(destination) => destination,
                    Err(PipelineError::Move { path, message }) => {
                        return Err(PipelineError::Move {
                            path,
                            message: format!("{message} (image was set aside: {reason})"),
                        });
                    }
                    Err(e) => return Err(e),
                };
                tracing::warn!("Moved {:?} to {:?}: {}", path, destination, reason);
                Ok(Outcome::Trouble {
                    source: path.to_path_buf(),
                    destination,
                    reason,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn convert(&self, path: &Path) -> PipelineResult<(std::path::PathBuf, String)> {
        let image = self.loader.load(path).await?;
        let request = LlmRequest::transcribe_recipe(image.into_input())
            .with_sampling(self.options.max_tokens, self.options.temperature);

        let response = self.request_with_retry(path, &request).await?;
        tracing::debug!(
            "{} responded for {:?} in {}ms ({} tokens)",
            response.model,
            path,
            response.latency_ms,
            response
                .tokens_used
                .map(|t| t.to_string())
                .unwrap_or_else(|| "?".to_string())
        );

        let Some(recipe) = parse_recipe(&response.text) else {
            let err = PipelineError::TitleNotFound {
                path: path.to_path_buf(),
            };
            tracing::error!(
                path = %path.display(),
                response = %preview(&response.text),
                "Title extraction error: {err}"
            );
            return Err(err);
        };

        let output = self.router.output_path_for(&recipe.title).ok_or_else(|| {
            tracing::error!(
                path = %path.display(),
                title = %recipe.title,
                "Title extraction error: title has no usable file name"
            );
            PipelineError::TitleNotFound {
                path: path.to_path_buf(),
            }
        })?;

        self.router.write_html(&output, &recipe.html)?;
        Ok((output, recipe.title))
    }

    /// Send the request, retrying transient failures with backoff.
    async fn request_with_retry(
        &self,
        path: &Path,
        request: &LlmRequest,
    ) -> PipelineResult<LlmResponse> {
        let mut last_error = None;

        for attempt in 0..=self.options.retry_attempts {
            if attempt > 0 {
                let delay = retry::backoff_duration(attempt - 1, self.options.retry_delay_ms);
                tracing::debug!(
                    "Retry {attempt}/{} for {:?} after {delay:?}",
                    self.options.retry_attempts,
                    path
                );
                tokio::time::sleep(delay).await;
            }

            let result = match tokio::time::timeout(
                Duration::from_millis(self.options.timeout_ms),
                self.provider.generate(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(PipelineError::Timeout {
                    path: path.to_path_buf(),
                    stage: "llm".to_string(),
                    timeout_ms: self.options.timeout_ms,
                }),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let retryable = retry::is_retryable(&e);
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PipelineError::Llm {
            message: "no request attempted".to_string(),
            status_code: None,
        }))
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(RESPONSE_PREVIEW_CHARS).collect();
    if text.chars().count() > RESPONSE_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    /// A scripted LLM provider: `response_fn` is called with the call index.
    struct MockProvider {
        response_fn: Box<dyn Fn(u32) -> Result<LlmResponse, PipelineError> + Send + Sync>,
        call_count: Arc<AtomicU32>,
        delay: Option<Duration>,
    }

    impl MockProvider {
        fn success(text: &str) -> Self {
            let text = text.to_string();
            Self {
                response_fn: Box::new(move |_| Ok(mock_response(&text))),
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
            }
        }

        fn failing(status_code: Option<u16>, message: &str) -> Self {
            let message = message.to_string();
            Self {
                response_fn: Box::new(move |_| {
                    Err(PipelineError::Llm {
                        message: message.clone(),
                        status_code,
                    })
                }),
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
            }
        }

        /// First call returns a 429, later calls succeed.
        fn rate_limited_then(text: &str) -> Self {
            let text = text.to_string();
            Self {
                response_fn: Box::new(move |idx| {
                    if idx == 0 {
                        Err(PipelineError::Llm {
                            message: "rate limited".to_string(),
                            status_code: Some(429),
                        })
                    } else {
                        Ok(mock_response(&text))
                    }
                }),
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
            }
        }

        /// First call fails as if the connection was refused, later calls succeed.
        fn unreachable_then(text: &str) -> Self {
            let text = text.to_string();
            Self {
                response_fn: Box::new(move |idx| {
                    if idx == 0 {
                        Err(PipelineError::Network {
                            message: "tcp connect error: Connection refused".to_string(),
                        })
                    } else {
                        Ok(mock_response(&text))
                    }
                }),
                call_count: Arc::new(AtomicU32::new(0)),
                delay: None,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }
    }

    fn mock_response(text: &str) -> LlmResponse {
        LlmResponse {
            text: text.to_string(),
            model: "mock-v1".to_string(),
            tokens_used: Some(42),
            latency_ms: 10,
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            (self.response_fn)(idx)
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("raw")).unwrap();
            Self { dir }
        }

        fn image(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join("raw").join(name);
            std::fs::write(&path, PNG_HEADER).unwrap();
            path
        }

        fn output_dir(&self) -> PathBuf {
            self.dir.path().join("html_files")
        }

        fn trouble_dir(&self) -> PathBuf {
            self.dir.path().join("trouble")
        }

        fn processor(&self, provider: MockProvider, options: ProcessOptions) -> RecipeProcessor {
            let router = FileRouter::new(self.output_dir(), self.trouble_dir());
            router.ensure_dirs().unwrap();
            RecipeProcessor::new(
                ImageLoader::new(LimitsConfig::default()),
                Box::new(provider),
                router,
                options,
            )
        }

        fn count(dir: &Path) -> usize {
            std::fs::read_dir(dir).unwrap().count()
        }
    }

    fn fast_options() -> ProcessOptions {
        ProcessOptions {
            timeout_ms: 5000,
            retry_attempts: 0,
            retry_delay_ms: 10,
            ..ProcessOptions::default()
        }
    }

    #[tokio::test]
    async fn test_fenced_response_writes_titled_html() {
        let fx = Fixture::new();
        let source = fx.image("recipe1.PNG");
        let response = "```html<h1>Pancakes</h1><ul><li>1 cup flour</li></ul>```";
        let processor = fx.processor(MockProvider::success(response), fast_options());

        let outcome = processor.process(&source).await.unwrap();

        let expected = fx.output_dir().join("Pancakes.html");
        match &outcome {
            Outcome::Written { output, title, .. } => {
                assert_eq!(output, &expected);
                assert_eq!(title, "Pancakes");
            }
            other => panic!("expected Written, got {other:?}"),
        }
        assert_eq!(
            std::fs::read_to_string(&expected).unwrap(),
            "<h1>Pancakes</h1><ul><li>1 cup flour</li></ul>"
        );
        assert_eq!(Fixture::count(&fx.trouble_dir()), 0);
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_response_without_heading_moves_image_to_trouble() {
        let fx = Fixture::new();
        let source = fx.image("recipe2.PNG");
        let response = "```html<p>Some recipe without a heading</p>```";
        let processor = fx.processor(MockProvider::success(response), fast_options());

        let outcome = processor.process(&source).await.unwrap();

        match &outcome {
            Outcome::Trouble {
                destination,
                reason,
                ..
            } => {
                assert_eq!(destination, &fx.trouble_dir().join("recipe2.PNG"));
                assert!(matches!(reason, PipelineError::TitleNotFound { .. }));
            }
            other => panic!("expected Trouble, got {other:?}"),
        }
        assert!(!source.exists());
        assert!(fx.trouble_dir().join("recipe2.PNG").exists());
        assert_eq!(Fixture::count(&fx.output_dir()), 0);
    }

    #[tokio::test]
    async fn test_existing_output_is_not_overwritten() {
        let fx = Fixture::new();
        let source = fx.image("recipe3.PNG");
        std::fs::create_dir_all(fx.output_dir()).unwrap();
        let existing = fx.output_dir().join("Pancakes.html");
        std::fs::write(&existing, "first batch").unwrap();

        let processor =
            fx.processor(MockProvider::success("<h1>Pancakes</h1>"), fast_options());
        let outcome = processor.process(&source).await.unwrap();

        match &outcome {
            Outcome::Trouble { reason, .. } => {
                assert!(matches!(reason, PipelineError::Collision { .. }));
            }
            other => panic!("expected Trouble, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "first batch");
        assert!(fx.trouble_dir().join("recipe3.PNG").exists());
    }

    #[tokio::test]
    async fn test_unsupported_image_goes_to_trouble_without_request() {
        let fx = Fixture::new();
        let source = fx.dir.path().join("raw").join("scan.png");
        std::fs::write(&source, b"not an image").unwrap();

        let provider = MockProvider::success("<h1>Never</h1>");
        let calls = provider.call_count_handle();
        let processor = fx.processor(provider, fast_options());

        let outcome = processor.process(&source).await.unwrap();
        assert!(!outcome.is_written());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_llm_error_propagates_and_leaves_image() {
        let fx = Fixture::new();
        let source = fx.image("recipe4.PNG");
        let processor = fx.processor(
            MockProvider::failing(Some(403), "API key not valid"),
            fast_options(),
        );

        let err = processor.process(&source).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Llm {
                status_code: Some(403),
                ..
            }
        ));
        assert!(source.exists());
        assert_eq!(Fixture::count(&fx.trouble_dir()), 0);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_rate_limit() {
        let fx = Fixture::new();
        let source = fx.image("recipe5.PNG");
        let provider = MockProvider::rate_limited_then("<h1>Waffles</h1>");
        let calls = provider.call_count_handle();
        let options = ProcessOptions {
            retry_attempts: 2,
            ..fast_options()
        };
        let processor = fx.processor(provider, options);

        let outcome = processor.process(&source).await.unwrap();
        assert!(outcome.is_written());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_refused_connection() {
        let fx = Fixture::new();
        let source = fx.image("recipe8.PNG");
        let provider = MockProvider::unreachable_then("<h1>Crepes</h1>");
        let calls = provider.call_count_handle();
        let options = ProcessOptions {
            retry_attempts: 1,
            ..fast_options()
        };
        let processor = fx.processor(provider, options);

        let outcome = processor.process(&source).await.unwrap();
        assert!(outcome.is_written());
        assert!(fx.output_dir().join("Crepes.html").exists());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_trouble_move_keeps_reason() {
        let fx = Fixture::new();
        let source = fx.image("recipe9.PNG");
        let processor =
            fx.processor(MockProvider::success("<p>no heading</p>"), fast_options());
        std::fs::remove_dir(fx.trouble_dir()).unwrap();
        std::fs::write(fx.trouble_dir(), b"in the way").unwrap();

        let err = processor.process(&source).await.unwrap_err();

        assert!(matches!(err, PipelineError::Move { .. }));
        assert!(err.to_string().contains("No <h1> title found"), "got {err}");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let fx = Fixture::new();
        let source = fx.image("recipe6.PNG");
        let provider = MockProvider::rate_limited_then("<h1>Waffles</h1>");
        let calls = provider.call_count_handle();
        let processor = fx.processor(provider, fast_options());

        assert!(processor.process(&source).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let fx = Fixture::new();
        let source = fx.image("recipe7.PNG");
        let provider =
            MockProvider::success("<h1>Slow</h1>").with_delay(Duration::from_secs(5));
        let options = ProcessOptions {
            timeout_ms: 50,
            ..fast_options()
        };
        let processor = fx.processor(provider, options);

        let err = processor.process(&source).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { timeout_ms: 50, .. }));
        assert!(source.exists());
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(RESPONSE_PREVIEW_CHARS + 10);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), RESPONSE_PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}
