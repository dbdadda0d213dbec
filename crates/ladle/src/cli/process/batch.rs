//! Batch processing: sequential per-image loop with progress and a summary.

use anyhow::Context;
use ladle_core::{BatchStats, DiscoveredFile, Outcome};

use super::{ProcessArgs, ProcessContext};

/// Process images one at a time.
///
/// Trouble outcomes are reported and skipped. Hard errors abort the batch
/// unless `--keep-going` is set, in which case the image is left in place
/// and counted as failed.
pub async fn process_batch(
    ctx: &ProcessContext,
    args: &ProcessArgs,
    files: Vec<DiscoveredFile>,
) -> anyhow::Result<BatchStats> {
    let progress = create_progress_bar(files.len() as u64);
    let mut stats = BatchStats::default();
    let start_time = std::time::Instant::now();

    for file in &files {
        progress.set_message(short_name(file));

        match ctx.processor.process(&file.path).await {
            Ok(outcome) => {
                stats.total_bytes += file.size;
                stats.record(&outcome);
                if let Outcome::Trouble { source, .. } = &outcome {
                    progress.suspend(|| {
                        println!("Image {} was not processed", source.display())
                    });
                }
            }
            Err(e) if args.keep_going => {
                stats.failed += 1;
                tracing::error!("Failed: {:?} - {}", file.path, e);
            }
            Err(e) => {
                progress.abandon();
                stats.elapsed = start_time.elapsed();
                print_summary(&stats);
                return Err(e).with_context(|| format!("Aborting batch at {:?}", file.path));
            }
        }

        progress.inc(1);
    }

    stats.elapsed = start_time.elapsed();
    progress.finish_and_clear();
    print_summary(&stats);

    Ok(stats)
}

fn short_name(file: &DiscoveredFile) -> String {
    file.path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(stats: &BatchStats) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Written:      {:>8}", stats.written);
    if stats.trouble > 0 {
        eprintln!("    Trouble:      {:>8}", stats.trouble);
    }
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total());
    eprintln!("    Duration:     {:>7.1}s", stats.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.2} img/sec", stats.rate());
    eprintln!(
        "    Read:         {:>7.1} MB",
        stats.total_bytes as f64 / 1_000_000.0
    );
    eprintln!("  ====================================");
}
