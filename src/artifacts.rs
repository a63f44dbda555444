//! Artifact storage and cross-request lifecycle management
//!
//! Each upload produces two on-disk artifacts: the *original* (reoriented,
//! resized upload) and the *processed* (background-removed) image. There is
//! no server-side session record; the filename is the whole capability. A
//! client holds the tokens between requests and redeems them exactly once,
//! via download or cancel, to finish the lifecycle. Every terminal transition
//! deletes the files it covers, and double deletion is always a no-op so
//! concurrent or repeated requests cannot race into an error.

use crate::config::StorageConfig;
use crate::error::{RemovalError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// The two artifact namespaces kept per upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The reoriented, resized upload shown next to the preview
    Original,
    /// The background-removed result offered for download
    Processed,
}

/// Bytes staged for transfer, named so repeated downloads never collide
#[derive(Debug, Clone)]
pub struct Download {
    /// Suggested client-side filename (`output_<timestamp>.png`)
    pub file_name: String,
    /// Encoded PNG content
    pub bytes: Vec<u8>,
}

/// Filesystem-backed store for original and processed artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store over the configured directories
    #[must_use]
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            upload_dir: storage.upload_dir,
            processed_dir: storage.processed_dir,
        }
    }

    /// Create both artifact directories if they do not exist yet
    ///
    /// # Errors
    /// Returns `RemovalError::Io` when a directory cannot be created.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.processed_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| RemovalError::file_io_error("create artifact directory", dir, &e))?;
        }
        Ok(())
    }

    /// Generate a fresh artifact token carrying the given file extension.
    ///
    /// Tokens are UUIDv4-based, unique, and never reused. The extension is
    /// normalized to lowercase alphanumerics so the token stays a single safe
    /// path segment no matter what the upload was called.
    #[must_use]
    pub fn new_token(extension: &str) -> String {
        let ext: String = extension
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(8)
            .collect::<String>()
            .to_lowercase();
        if ext.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{ext}", Uuid::new_v4())
        }
    }

    /// Store artifact bytes under a token
    ///
    /// # Errors
    /// Returns `RemovalError::ArtifactNotFound` for a malformed token and
    /// `RemovalError::Io` on write failure.
    pub async fn save(&self, kind: ArtifactKind, token: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(kind, token)?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| RemovalError::file_io_error("write artifact", &path, &e))?;
        debug!(?kind, token, size = bytes.len(), "stored artifact");
        Ok(())
    }

    /// Read artifact bytes back by token
    ///
    /// # Errors
    /// Returns `RemovalError::ArtifactNotFound` when the token is malformed
    /// or the file is gone (stale token after a terminal transition).
    pub async fn read(&self, kind: ArtifactKind, token: &str) -> Result<Vec<u8>> {
        let path = self.resolve(kind, token)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RemovalError::artifact_not_found(token))
            },
            Err(e) => Err(RemovalError::file_io_error("read artifact", &path, &e)),
        }
    }

    /// Whether an artifact currently exists for the token
    pub async fn exists(&self, kind: ArtifactKind, token: &str) -> bool {
        match self.resolve(kind, token) {
            Ok(path) => fs::metadata(&path).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Delete an artifact if it exists.
    ///
    /// Absent files and malformed tokens are no-ops, so concurrent deletes of
    /// the same token all succeed. Returns whether a file was actually
    /// removed.
    ///
    /// # Errors
    /// Returns `RemovalError::Io` only for real filesystem failures
    /// (permissions and the like), never for a missing file.
    pub async fn remove(&self, kind: ArtifactKind, token: &str) -> Result<bool> {
        let Ok(path) = self.resolve(kind, token) else {
            return Ok(false);
        };
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(?kind, token, "removed artifact");
                Ok(true)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RemovalError::file_io_error("remove artifact", &path, &e)),
        }
    }

    /// Stage the processed artifact for transfer and finish the lifecycle.
    ///
    /// Validates the processed artifact, reads its bytes, derives a
    /// timestamp-qualified transfer name, then deletes the processed artifact
    /// and, when a token was supplied, the original as well. Cleanup is not
    /// contingent on the caller successfully streaming the returned bytes.
    ///
    /// # Errors
    /// Returns `RemovalError::ArtifactNotFound` for a stale or unknown
    /// processed token.
    pub async fn finalize_download(
        &self,
        processed_token: &str,
        original_token: Option<&str>,
    ) -> Result<Download> {
        let bytes = self.read(ArtifactKind::Processed, processed_token).await?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H%M%S");
        let file_name = format!("output_{timestamp}.png");

        if let Err(e) = self.remove(ArtifactKind::Processed, processed_token).await {
            warn!(token = processed_token, error = %e, "failed to remove processed artifact after download");
        }
        if let Some(original) = original_token {
            if let Err(e) = self.remove(ArtifactKind::Original, original).await {
                warn!(token = original, error = %e, "failed to remove original artifact after download");
            }
        }

        Ok(Download { file_name, bytes })
    }

    /// Discard both artifacts of a session.
    ///
    /// Idempotent: either or both artifacts may already be absent, and
    /// repeated or concurrent cancels all succeed.
    ///
    /// # Errors
    /// Returns `RemovalError::Io` only for real filesystem failures.
    pub async fn cancel(&self, original_token: &str, processed_token: &str) -> Result<()> {
        self.remove(ArtifactKind::Original, original_token).await?;
        self.remove(ArtifactKind::Processed, processed_token).await?;
        Ok(())
    }

    /// Map a token to its path, rejecting anything that is not a plain file
    /// name inside the artifact directory
    fn resolve(&self, kind: ArtifactKind, token: &str) -> Result<PathBuf> {
        if !Self::is_valid_token(token) {
            return Err(RemovalError::artifact_not_found(token));
        }
        Ok(self.dir(kind).join(token))
    }

    fn dir(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Original => &self.upload_dir,
            ArtifactKind::Processed => &self.processed_dir,
        }
    }

    /// A token must be a single path segment: no separators, no traversal,
    /// no hidden-file tricks
    fn is_valid_token(token: &str) -> bool {
        !token.is_empty()
            && !token.starts_with('.')
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> ArtifactStore {
        ArtifactStore::new(StorageConfig {
            upload_dir: tmp.path().join("uploads"),
            processed_dir: tmp.path().join("processed"),
        })
    }

    #[tokio::test]
    async fn test_save_read_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        let token = ArtifactStore::new_token("png");
        store
            .save(ArtifactKind::Original, &token, b"fake image bytes")
            .await
            .unwrap();

        let bytes = store.read(ArtifactKind::Original, &token).await.unwrap();
        assert_eq!(bytes, b"fake image bytes");
    }

    #[tokio::test]
    async fn test_read_unknown_token_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        let err = store
            .read(ArtifactKind::Processed, "no-such-token.png")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        let token = ArtifactStore::new_token("png");
        store
            .save(ArtifactKind::Processed, &token, b"data")
            .await
            .unwrap();

        assert!(store.remove(ArtifactKind::Processed, &token).await.unwrap());
        assert!(!store.remove(ArtifactKind::Processed, &token).await.unwrap());
        assert!(!store.remove(ArtifactKind::Processed, &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_tolerates_absent_artifacts() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        // Neither artifact exists; both cancels succeed anyway.
        store.cancel("gone.jpg", "gone.png").await.unwrap();
        store.cancel("gone.jpg", "gone.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_finalize_download_removes_both_artifacts() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        let original = ArtifactStore::new_token("jpg");
        let processed = ArtifactStore::new_token("png");
        store
            .save(ArtifactKind::Original, &original, b"orig")
            .await
            .unwrap();
        store
            .save(ArtifactKind::Processed, &processed, b"proc")
            .await
            .unwrap();

        let download = store
            .finalize_download(&processed, Some(&original))
            .await
            .unwrap();
        assert_eq!(download.bytes, b"proc");
        assert!(download.file_name.starts_with("output_"));
        assert!(download.file_name.ends_with(".png"));

        assert!(!store.exists(ArtifactKind::Original, &original).await);
        assert!(!store.exists(ArtifactKind::Processed, &processed).await);
    }

    #[tokio::test]
    async fn test_second_download_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        let processed = ArtifactStore::new_token("png");
        store
            .save(ArtifactKind::Processed, &processed, b"proc")
            .await
            .unwrap();

        store.finalize_download(&processed, None).await.unwrap();
        let err = store.finalize_download(&processed, None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_download_keeps_original_without_token() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        let original = ArtifactStore::new_token("jpg");
        let processed = ArtifactStore::new_token("png");
        store
            .save(ArtifactKind::Original, &original, b"orig")
            .await
            .unwrap();
        store
            .save(ArtifactKind::Processed, &processed, b"proc")
            .await
            .unwrap();

        store.finalize_download(&processed, None).await.unwrap();
        assert!(store.exists(ArtifactKind::Original, &original).await);
    }

    #[tokio::test]
    async fn test_traversal_tokens_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().await.unwrap();

        for token in ["../outside.png", "a/b.png", "..", ".hidden", ""] {
            let err = store.read(ArtifactKind::Original, token).await.unwrap_err();
            assert!(err.is_not_found(), "token {token:?} must read as missing");
            // Deleting with a malformed token is a tolerated no-op.
            assert!(!store.remove(ArtifactKind::Original, token).await.unwrap());
        }
    }

    #[test]
    fn test_token_shape() {
        let token = ArtifactStore::new_token("PNG");
        assert!(token.ends_with(".png"));
        assert!(ArtifactStore::is_valid_token(&token));

        let bare = ArtifactStore::new_token("");
        assert!(!bare.contains('.'));
        assert!(ArtifactStore::is_valid_token(&bare));

        // Extension is reduced to a safe segment.
        let weird = ArtifactStore::new_token("p/../ng");
        assert!(weird.ends_with(".png"));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = ArtifactStore::new_token("png");
        let b = ArtifactStore::new_token("png");
        assert_ne!(a, b);
    }
}
