//! Image loading with size and format checks.

use std::path::{Path, PathBuf};

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::llm::ImageInput;

/// Raw image bytes read from disk, with the sniffed format.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    /// Format identifier ("png", "jpeg", "webp", "heic")
    pub format: &'static str,
}

impl LoadedImage {
    /// Encode for the model request. Consumes the bytes.
    pub fn into_input(self) -> ImageInput {
        ImageInput::from_bytes(&self.bytes, self.format)
    }
}

/// Reads image files and rejects ones the model cannot accept.
pub struct ImageLoader {
    limits: LimitsConfig,
}

impl ImageLoader {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read an image file.
    ///
    /// Checks:
    /// - File exists
    /// - File size is within limits
    /// - Magic bytes match a format the model accepts
    pub async fn load(&self, path: &Path) -> Result<LoadedImage, PipelineError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(PipelineError::Read {
                    path: path.to_path_buf(),
                    message: format!("Cannot read metadata: {e}"),
                });
            }
        };

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let format = sniff_format(&bytes).ok_or_else(|| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
        })?;

        tracing::debug!("Loaded {:?} ({} bytes, {})", path, bytes.len(), format);

        Ok(LoadedImage {
            path: path.to_path_buf(),
            bytes,
            format,
        })
    }
}

/// Identify the image format from its header bytes.
fn sniff_format(header: &[u8]) -> Option<&'static str> {
    // PNG: 89 50 4E 47
    if header.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some("png");
    }

    // JPEG: FF D8 FF
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpeg");
    }

    // WebP: RIFF....WEBP
    if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
        return Some("webp");
    }

    // HEIC/HEIF: ....ftyp<brand>
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        return match &header[8..12] {
            b"heic" | b"heix" => Some("heic"),
            b"mif1" | b"heif" => Some("heif"),
            _ => None,
        };
    }

    None
}
