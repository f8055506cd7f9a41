//! Core data types shared by the store, the caption service and the scheduler.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::CaptionConfig;
use crate::error::CaptionError;

/// An upload as received from a client, before anything touches disk.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as sent by the client (unsanitized)
    pub file_name: String,

    /// Raw file contents
    pub bytes: Vec<u8>,

    /// Requested caption token budget
    pub length: CaptionLength,
}

/// An image persisted in the image store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredImage {
    /// Sanitized filename, also the key used to serve it back
    pub file_name: String,

    /// Location on disk
    pub path: PathBuf,

    /// File size in bytes
    pub size: u64,

    /// BLAKE3 hash of the contents
    pub content_hash: String,
}

impl StoredImage {
    /// URL path the image is served under.
    pub fn url(&self) -> String {
        format!("/uploads/{}", self.file_name)
    }
}

/// Caption token budget, validated against the configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptionLength(u32);

impl CaptionLength {
    /// Validate a numeric length against `config.min_length..=config.max_length`.
    pub fn new(value: u32, config: &CaptionConfig) -> Result<Self, CaptionError> {
        if (config.min_length..=config.max_length).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CaptionError::InvalidLength {
                value: value.to_string(),
                min: config.min_length,
                max: config.max_length,
            })
        }
    }

    /// Parse a form field. Missing or blank input falls back to the default length.
    pub fn parse(raw: Option<&str>, config: &CaptionConfig) -> Result<Self, CaptionError> {
        match raw.map(str::trim) {
            None | Some("") => Self::new(config.default_length, config),
            Some(text) => {
                let value = text.parse::<u32>().map_err(|_| CaptionError::InvalidLength {
                    value: text.to_string(),
                    min: config.min_length,
                    max: config.max_length,
                })?;
                Self::new(value, config)
            }
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Outcome of the upload → caption → hashtags → schedule flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResult {
    pub image: StoredImage,
    pub caption: String,
    pub hashtags: Vec<String>,
    /// When the simulated post is due to fire
    pub scheduled_at: DateTime<Local>,
}

/// Caption and hashtags for a file, without storing or scheduling anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionOutput {
    pub file_path: PathBuf,
    pub caption: String,
    pub hashtags: Vec<String>,
}

/// A simulated social post handed to a publisher when its job fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Caption followed by the hashtag line
    pub caption: String,

    /// Image the post refers to
    pub image_path: PathBuf,

    /// When the post fired
    pub posted_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_length_bounds() {
        let config = CaptionConfig::default();
        assert!(CaptionLength::new(10, &config).is_ok());
        assert!(CaptionLength::new(200, &config).is_ok());
        assert!(CaptionLength::new(9, &config).is_err());
        assert!(CaptionLength::new(201, &config).is_err());
    }

    #[test]
    fn test_caption_length_parse_default() {
        let config = CaptionConfig::default();
        assert_eq!(CaptionLength::parse(None, &config).unwrap().get(), 80);
        assert_eq!(CaptionLength::parse(Some("  "), &config).unwrap().get(), 80);
    }

    #[test]
    fn test_caption_length_parse_rejects_garbage() {
        let config = CaptionConfig::default();
        let err = CaptionLength::parse(Some("lots"), &config).unwrap_err();
        assert!(matches!(err, CaptionError::InvalidLength { ref value, .. } if value == "lots"));
    }

    #[test]
    fn test_caption_length_parse_trims() {
        let config = CaptionConfig::default();
        assert_eq!(CaptionLength::parse(Some(" 120 "), &config).unwrap().get(), 120);
    }

    #[test]
    fn test_stored_image_url() {
        let image = StoredImage {
            file_name: "cat.jpg".into(),
            path: PathBuf::from("uploads/cat.jpg"),
            size: 3,
            content_hash: "abc".into(),
        };
        assert_eq!(image.url(), "/uploads/cat.jpg");
    }
}
