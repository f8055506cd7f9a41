//! Error types for autocaption.
//!
//! Errors are grouped by concern (configuration, captioning, scheduling) so
//! the HTTP layer can map each variant to a distinct status without parsing
//! messages.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for autocaption operations.
#[derive(Error, Debug)]
pub enum AutocaptionError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Upload, validation and inference errors
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Post scheduling errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AutocaptionError {
    /// Short machine-readable identifier for API responses and job records.
    pub fn code(&self) -> &'static str {
        match self {
            AutocaptionError::Config(_) => "config_error",
            AutocaptionError::Caption(e) => e.code(),
            AutocaptionError::Schedule(e) => e.code(),
            AutocaptionError::Io(_) => "io_error",
            AutocaptionError::Json(_) => "json_error",
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while accepting an upload and captioning it.
#[derive(Error, Debug)]
pub enum CaptionError {
    /// The multipart request carried no file (or an empty one)
    #[error("No file provided")]
    NoFile,

    /// The client-supplied filename sanitized to nothing
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    /// Requested caption length outside the accepted range
    #[error("Caption length {value} is outside {min}..={max}")]
    InvalidLength { value: String, min: u32, max: u32 },

    /// Upload exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Not an image, or an image format we do not caption
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The inference backend failed or returned nothing usable
    #[error("Inference failed: {message}")]
    Inference {
        message: String,
        status_code: Option<u16>,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// Writing or reading the image store failed
    #[error("Storage error for {path}: {message}")]
    Storage { path: PathBuf, message: String },
}

impl CaptionError {
    /// Short machine-readable identifier, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            CaptionError::NoFile => "no_file",
            CaptionError::InvalidFilename(_) => "invalid_filename",
            CaptionError::InvalidLength { .. } => "invalid_length",
            CaptionError::FileTooLarge { .. } => "file_too_large",
            CaptionError::ImageTooLarge { .. } => "image_too_large",
            CaptionError::UnsupportedFormat { .. } => "unsupported_format",
            CaptionError::FileNotFound(_) => "not_found",
            CaptionError::Inference { .. } => "inference_failed",
            CaptionError::Timeout { .. } => "timeout",
            CaptionError::Storage { .. } => "storage_error",
        }
    }
}

/// Errors raised by the post scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Too many posts are already waiting to fire
    #[error("Post queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },

    /// The delay is too far in the future to represent
    #[error("Post delay of {delay_secs}s is out of range")]
    DelayOutOfRange { delay_secs: u64 },

    /// The scheduler task has stopped
    #[error("Post scheduler is not running")]
    Closed,
}

impl ScheduleError {
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::QueueFull { .. } => "queue_full",
            ScheduleError::DelayOutOfRange { .. } => "delay_out_of_range",
            ScheduleError::Closed => "scheduler_closed",
        }
    }
}

/// Convenience type alias for autocaption results.
pub type Result<T> = std::result::Result<T, AutocaptionError>;

/// Convenience type alias for caption-specific results.
pub type CaptionResult<T> = std::result::Result<T, CaptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_error_codes_are_distinct() {
        let errors = [
            CaptionError::NoFile,
            CaptionError::UnsupportedFormat {
                path: PathBuf::from("a.txt"),
                format: "text".into(),
            },
            CaptionError::Inference {
                message: "boom".into(),
                status_code: Some(500),
            },
        ];
        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, ["no_file", "unsupported_format", "inference_failed"]);
    }

    #[test]
    fn test_invalid_length_message() {
        let err = CaptionError::InvalidLength {
            value: "500".into(),
            min: 10,
            max: 200,
        };
        assert_eq!(err.to_string(), "Caption length 500 is outside 10..=200");
    }

    #[test]
    fn test_wraps_into_top_level() {
        let err: AutocaptionError = ScheduleError::Closed.into();
        assert!(matches!(err, AutocaptionError::Schedule(ScheduleError::Closed)));
        assert_eq!(err.code(), "scheduler_closed");
    }
}
