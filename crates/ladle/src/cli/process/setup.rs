//! Processor setup: config overrides, credential check, provider creation.

use ladle_core::{create_provider, Config, FileDiscovery, RecipeProcessor};

use super::{ProcessArgs, ProcessContext};

/// Apply CLI overrides to `config` and assemble everything needed for processing.
///
/// A missing API key is fatal here, before any image is read.
pub fn setup_processor(args: &ProcessArgs, mut config: Config) -> anyhow::Result<ProcessContext> {
    apply_overrides(&mut config, args);
    config.validate()?;

    let api_key = match args.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => key.to_string(),
        None => config.gemini_api_key()?,
    };

    let input = args.input.clone().unwrap_or_else(|| config.raw_dir());
    if !input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the path or set paths.raw_dir in `ladle config path`.",
            input
        );
    }

    let provider = create_provider(&config.llm, &api_key, args.model.as_deref())?;
    let processor = RecipeProcessor::from_config(&config, provider);

    let discovery = FileDiscovery::new(config.processing.clone())
        .excluding([config.output_dir(), config.trouble_dir()]);

    tracing::debug!(
        "Output to {:?}, trouble to {:?}",
        config.output_dir(),
        config.trouble_dir()
    );

    Ok(ProcessContext {
        processor,
        discovery,
        input,
        config,
    })
}

/// Copy CLI flags over config values.
fn apply_overrides(config: &mut Config, args: &ProcessArgs) {
    if let Some(dir) = &args.output_dir {
        config.paths.output_dir = dir.clone();
    }
    if let Some(dir) = &args.trouble_dir {
        config.paths.trouble_dir = dir.clone();
    }
    if let Some(model) = &args.model {
        config.llm.gemini.model = model.clone();
    }
    if let Some(retries) = args.retries {
        config.pipeline.retry_attempts = retries;
    }
    if args.recursive {
        config.processing.recursive = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> ProcessArgs {
        ProcessArgs {
            input: None,
            output_dir: None,
            trouble_dir: None,
            model: None,
            api_key: None,
            retries: None,
            recursive: false,
            keep_going: false,
            dry_run: false,
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let args = ProcessArgs {
            output_dir: Some(PathBuf::from("recipes")),
            trouble_dir: Some(PathBuf::from("bad")),
            model: Some("gemini-2.5-flash".to_string()),
            retries: Some(3),
            recursive: true,
            ..args()
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.paths.output_dir, PathBuf::from("recipes"));
        assert_eq!(config.paths.trouble_dir, PathBuf::from("bad"));
        assert_eq!(config.llm.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.pipeline.retry_attempts, 3);
        assert!(config.processing.recursive);
    }

    #[test]
    fn test_apply_overrides_keeps_config_when_unset() {
        let mut config = Config::default();
        apply_overrides(&mut config, &args());
        assert_eq!(config.paths.output_dir, PathBuf::from("data/html_files"));
        assert_eq!(config.pipeline.retry_attempts, 0);
        assert!(!config.processing.recursive);
    }

    #[test]
    fn test_setup_uses_given_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.raw_dir = dir.path().join("missing-scans");
        config.llm.gemini.api_key = "literal-key".to_string();

        let err = setup_processor(&args(), config).err().unwrap();

        assert!(err.to_string().contains("missing-scans"), "got {err}");
    }

    #[test]
    fn test_setup_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.raw_dir = dir.path().to_path_buf();
        config.llm.gemini.api_key = String::new();

        let err = setup_processor(&args(), config).err().unwrap();

        assert!(matches!(
            err.downcast_ref::<ladle_core::ConfigError>(),
            Some(ladle_core::ConfigError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_setup_builds_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.raw_dir = dir.path().join("raw");
        config.paths.output_dir = dir.path().join("html_files");
        config.paths.trouble_dir = dir.path().join("trouble");
        std::fs::create_dir_all(config.raw_dir()).unwrap();
        let args = ProcessArgs {
            api_key: Some("from-flag".to_string()),
            ..args()
        };

        let ctx = setup_processor(&args, config).unwrap();

        assert_eq!(ctx.input, dir.path().join("raw"));
        assert_eq!(ctx.processor.provider_name(), "gemini");
    }
}
