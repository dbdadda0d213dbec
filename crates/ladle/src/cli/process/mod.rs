//! The `ladle process` command for transcribing recipe images.

mod batch;
mod setup;

use clap::Args;
use ladle_core::{Config, FileDiscovery, RecipeProcessor};
use std::path::PathBuf;

use batch::process_batch;
use setup::setup_processor;

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image file or directory to process (defaults to paths.raw_dir)
    pub input: Option<PathBuf>,

    /// Directory for generated HTML files (overrides paths.output_dir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for images that could not be converted (overrides paths.trouble_dir)
    #[arg(short, long)]
    pub trouble_dir: Option<PathBuf>,

    /// Gemini model name (overrides llm.gemini.model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Gemini API key (overrides llm.gemini.api_key)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Retry attempts for rate limits and server errors (overrides pipeline.retry_attempts)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Search subdirectories of the input directory
    #[arg(short, long)]
    pub recursive: bool,

    /// Keep going after network or filesystem errors instead of aborting
    #[arg(long)]
    pub keep_going: bool,

    /// List the images that would be processed, then exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Processing context assembled by setup_processor().
pub(crate) struct ProcessContext {
    pub processor: RecipeProcessor,
    pub discovery: FileDiscovery,
    pub input: PathBuf,
    pub config: Config,
}

/// Execute the process command against an already loaded config.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_processor(&args, config)?;

    let files = ctx.discovery.discover(&ctx.input);
    if files.is_empty() {
        tracing::warn!(
            "No images matching {:?} found at {:?}",
            ctx.config.processing.supported_formats,
            ctx.input
        );
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s) to process with {}",
        files.len(),
        ctx.processor.provider_name()
    );

    if args.dry_run {
        for file in &files {
            println!("{}", file.path.display());
        }
        return Ok(());
    }

    ctx.processor.router().ensure_dirs()?;
    process_batch(&ctx, &args, files).await?;
    Ok(())
}
