//! Upload validation before any inference work.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::CaptionError;

/// Validates uploaded bytes before probing.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Quick checks on an in-memory upload.
    ///
    /// Checks:
    /// - There is something to caption
    /// - Size is within limits
    /// - Leading bytes look like a known image format
    pub fn validate(&self, bytes: &[u8], path: &Path) -> Result<(), CaptionError> {
        if bytes.is_empty() {
            return Err(CaptionError::NoFile);
        }

        let max_bytes = self.limits.max_upload_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(CaptionError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: bytes.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_upload_mb,
            });
        }

        if !Self::is_valid_image_header(bytes) {
            return Err(CaptionError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: "unrecognized (invalid magic bytes)".to_string(),
            });
        }

        Ok(())
    }

    /// Check if the header bytes match known image formats.
    fn is_valid_image_header(header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // PNG: 89 50 4E 47
        if header.starts_with(&[0x89, b'P', b'N', b'G']) {
            return true;
        }

        // GIF: GIF8
        if header.starts_with(b"GIF8") {
            return true;
        }

        // WebP: RIFF....WEBP
        if header.starts_with(b"RIFF") {
            return header.len() >= 12 && &header[8..12] == b"WEBP";
        }

        // BMP: BM
        if header.starts_with(b"BM") {
            return true;
        }

        // TIFF: II or MM followed by version 42
        if header.starts_with(&[b'I', b'I', 0x2A, 0x00]) || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
        {
            return true;
        }

        // HEIC/HEIF/AVIF: ftyp box at offset 4
        header.len() >= 12 && &header[4..8] == b"ftyp"
    }
}
