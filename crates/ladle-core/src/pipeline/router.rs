//! File placement: write HTML on success, park the source image on failure.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Longest file stem kept from a title, in bytes.
const MAX_STEM_BYTES: usize = 200;

/// Places results in the output and trouble directories.
pub struct FileRouter {
    output_dir: PathBuf,
    trouble_dir: PathBuf,
}

impl FileRouter {
    pub fn new(output_dir: impl Into<PathBuf>, trouble_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            trouble_dir: trouble_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn trouble_dir(&self) -> &Path {
        &self.trouble_dir
    }

    /// Create the output and trouble directories if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        std::fs::create_dir_all(&self.trouble_dir)
    }

    /// `<output_dir>/<title>.html`, or `None` if nothing usable is left of
    /// the title once unsafe characters are replaced.
    pub fn output_path_for(&self, title: &str) -> Option<PathBuf> {
        file_stem(title).map(|stem| self.output_dir.join(format!("{stem}.html")))
    }

    /// Write `html` to `path`, refusing to replace an existing file.
    pub fn write_html(&self, path: &Path, html: &str) -> Result<(), PipelineError> {
        if path.exists() {
            return Err(PipelineError::Collision {
                path: path.to_path_buf(),
            });
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => PipelineError::Collision {
                    path: path.to_path_buf(),
                },
                _ => PipelineError::Write {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
            })?;

        file.write_all(html.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| PipelineError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Move `source` into the trouble directory, returning its new path.
    ///
    /// An image of the same name already parked there is kept; the new one
    /// gets a `-1`, `-2`, ... suffix.
    pub fn move_to_trouble(&self, source: &Path) -> Result<PathBuf, PipelineError> {
        let move_err = |message: String| PipelineError::Move {
            path: source.to_path_buf(),
            message,
        };

        std::fs::create_dir_all(&self.trouble_dir).map_err(|e| move_err(e.to_string()))?;

        let file_name = source
            .file_name()
            .ok_or_else(|| move_err("source has no file name".to_string()))?;
        let destination = unique_destination(&self.trouble_dir.join(file_name));

        if let Err(rename_err) = std::fs::rename(source, &destination) {
            // rename fails across filesystems
            tracing::debug!("rename failed ({rename_err}), falling back to copy");
            std::fs::copy(source, &destination)
                .map_err(|_| move_err(rename_err.to_string()))?;
            std::fs::remove_file(source).map_err(|e| move_err(e.to_string()))?;
        }

        Ok(destination)
    }
}

/// File-system-safe stem for a title.
fn file_stem(title: &str) -> Option<String> {
    let mut stem: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.len() > MAX_STEM_BYTES {
        let mut cut = MAX_STEM_BYTES;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        stem.truncate(cut);
    }

    let stem = stem.trim().trim_end_matches(['.', ' ']);
    if stem.is_empty() || stem.chars().all(|c| c == '_' || c == '.') {
        None
    } else {
        Some(stem.to_string())
    }
}

fn unique_destination(candidate: &Path) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = candidate.parent().unwrap_or_else(|| Path::new("."));

    (1u32..)
        .map(|n| parent.join(format!("{stem}-{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or_else(|| candidate.to_path_buf())
}
