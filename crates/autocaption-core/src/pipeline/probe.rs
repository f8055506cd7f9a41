//! Format and dimension probing with timeout support.
//!
//! Only the image header is parsed; pixel data is never decoded since the
//! caption provider receives the original bytes.

use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::CaptionError;

/// Probes uploads for format and size, enforcing configured limits.
pub struct ImageProbe {
    limits: LimitsConfig,
}

/// What the probe learned about an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ProbedImage {
    /// Lower-case format identifier ("jpeg", "png", ...).
    pub fn format_name(&self) -> &'static str {
        format_name(self.format)
    }
}

impl ImageProbe {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Probe an in-memory image on the blocking pool, bounded by the decode timeout.
    pub async fn probe(&self, bytes: Vec<u8>, path: &Path) -> Result<ProbedImage, CaptionError> {
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let probe_result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || Self::probe_sync(bytes, &path_owned)),
        )
        .await;

        let probed = match probe_result {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                return Err(CaptionError::Storage {
                    path: path.to_path_buf(),
                    message: format!("Task join error: {e}"),
                })
            }
            Err(_) => {
                return Err(CaptionError::Timeout {
                    stage: "probe".to_string(),
                    timeout_ms: self.limits.decode_timeout_ms,
                })
            }
        };

        let name = probed.format_name();
        if !self.limits.supported_formats.iter().any(|f| f == name) {
            return Err(CaptionError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: name.to_string(),
            });
        }

        if probed.width > self.limits.max_image_dimension
            || probed.height > self.limits.max_image_dimension
        {
            return Err(CaptionError::ImageTooLarge {
                path: path.to_path_buf(),
                width: probed.width,
                height: probed.height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        Ok(probed)
    }

    fn probe_sync(bytes: Vec<u8>, path: &Path) -> Result<ProbedImage, CaptionError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CaptionError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: format!("cannot detect format: {e}"),
            })?;

        let format = reader.format().ok_or_else(|| CaptionError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?;

        let (width, height) =
            reader
                .into_dimensions()
                .map_err(|e| CaptionError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format: format!("{}: {e}", format_name(format)),
                })?;

        Ok(ProbedImage {
            format,
            width,
            height,
        })
    }
}

/// Convert an ImageFormat to its lower-case identifier.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Avif => "avif",
        _ => "unknown",
    }
}

/// MIME type for an ImageFormat.
pub fn media_type(format: ImageFormat) -> &'static str {
    format.to_mime_type()
}
