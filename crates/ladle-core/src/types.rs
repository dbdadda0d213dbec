//! Core data types passed between pipeline stages.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::PipelineError;

/// A transcribed recipe: fence-free HTML and the title taken from its `<h1>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub title: String,
    pub html: String,
}

/// Terminal state of one source image.
#[derive(Debug)]
pub enum Outcome {
    /// HTML written to `output`.
    Written {
        source: PathBuf,
        output: PathBuf,
        title: String,
    },
    /// Source image moved to the trouble directory.
    Trouble {
        source: PathBuf,
        destination: PathBuf,
        reason: PipelineError,
    },
}

impl Outcome {
    pub fn source(&self) -> &PathBuf {
        match self {
            Outcome::Written { source, .. } | Outcome::Trouble { source, .. } => source,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Outcome::Written { .. })
    }
}

/// Counters for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// HTML files written
    pub written: u64,
    /// Images moved to the trouble directory
    pub trouble: u64,
    /// Images left in place after a hard error (only with keep-going)
    pub failed: u64,
    /// Bytes of image data read
    pub total_bytes: u64,
    /// Wall-clock duration of the batch
    pub elapsed: Duration,
}

impl BatchStats {
    /// Record a terminal outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Written { .. } => self.written += 1,
            Outcome::Trouble { .. } => self.trouble += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.written + self.trouble + self.failed
    }

    /// Images per second over the whole batch.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total() as f64 / secs
        } else {
            0.0
        }
    }
}
