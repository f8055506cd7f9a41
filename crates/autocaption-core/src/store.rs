//! Local-disk image store.
//!
//! Uploads are written under a single directory keyed by their sanitized
//! filename. A second upload with the same name overwrites the first; nothing
//! is ever deleted.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::CaptionError;
use crate::types::StoredImage;

/// Stores uploaded images and serves them back by name.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open (and create if needed) the store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::debug!(dir = %root.display(), "Image store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload to disk under its sanitized name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredImage, CaptionError> {
        let file_name = sanitize_filename(original_name)
            .ok_or_else(|| CaptionError::InvalidFilename(original_name.to_string()))?;
        let path = self.root.join(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CaptionError::Storage {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let stored = StoredImage {
            file_name,
            path,
            size: bytes.len() as u64,
            content_hash: content_hash(bytes),
        };
        tracing::info!(
            file = %stored.file_name,
            size = stored.size,
            hash = %stored.content_hash,
            "Stored upload"
        );
        Ok(stored)
    }

    /// Resolve a served name to a path inside the store.
    ///
    /// Only names that are already in sanitized form resolve, so a request
    /// can never address anything outside the store directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        match sanitize_filename(name) {
            Some(clean) if clean == name => Some(self.root.join(clean)),
            _ => None,
        }
    }

    /// Read a stored image back by name.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, CaptionError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| CaptionError::FileNotFound(PathBuf::from(name)))?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CaptionError::FileNotFound(path))
            }
            Err(e) => Err(CaptionError::Storage {
                path,
                message: e.to_string(),
            }),
        }
    }
}

/// BLAKE3 hash of an in-memory buffer, hex encoded.
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Reduce a client-supplied filename to a safe, flat name.
///
/// The name is NFKD-normalized so accented letters fold to their ASCII base,
/// then remaining non-ASCII characters are dropped, path separators become spaces, runs of
/// whitespace collapse into `_`, anything outside `[A-Za-z0-9_.-]` is
/// removed and leading/trailing `.` or `_` are trimmed. Returns `None` when
/// nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let ascii: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_filename("cat.jpg").as_deref(), Some("cat.jpg"));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\photos\\beach day.png").as_deref(),
            Some("C_photos_beach_day.png")
        );
    }

    #[test]
    fn test_sanitize_spaces_and_symbols() {
        assert_eq!(
            sanitize_filename("my  holiday (1).jpeg").as_deref(),
            Some("my_holiday_1.jpeg")
        );
    }

    #[test]
    fn test_sanitize_folds_accents() {
        assert_eq!(sanitize_filename("café.png").as_deref(), Some("cafe.png"));
        assert_eq!(
            sanitize_filename("Crème Brûlée.jpg").as_deref(),
            Some("Creme_Brulee.jpg")
        );
    }

    #[test]
    fn test_sanitize_drops_unfoldable_characters() {
        assert_eq!(sanitize_filename("猫cat.png").as_deref(), Some("cat.png"));
    }

    #[test]
    fn test_sanitize_rejects_empty_result() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename("日本"), None);
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::open(dir.path().join("uploads")).await.unwrap();

        let stored = store.save("cat.jpg", b"meow").await.unwrap();
        assert_eq!(stored.file_name, "cat.jpg");
        assert_eq!(stored.size, 4);
        assert!(stored.path.starts_with(store.root()));

        let bytes = store.read("cat.jpg").await.unwrap();
        assert_eq!(bytes, b"meow");
    }

    #[tokio::test]
    async fn test_save_overwrites_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::open(dir.path()).await.unwrap();

        store.save("dog.png", b"first").await.unwrap();
        store.save("dog.png", b"second").await.unwrap();

        assert_eq!(store.read("dog.png").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_save_rejects_unusable_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::open(dir.path()).await.unwrap();

        let err = store.save("///", b"x").await.unwrap_err();
        assert!(matches!(err, CaptionError::InvalidFilename(_)));
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::open(dir.path()).await.unwrap();

        let err = store.read("does-not-exist.jpg").await.unwrap_err();
        assert!(matches!(err, CaptionError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_refuses_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::open(dir.path()).await.unwrap();

        assert!(store.resolve("../secret.jpg").is_none());
        assert!(store.resolve("a b.jpg").is_none());
        assert!(store.resolve("ok.jpg").is_some());
    }
}
