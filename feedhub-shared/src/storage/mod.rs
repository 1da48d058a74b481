/// Remote object storage
///
/// Uploaded media is kept by an external media CDN, not by FeedHub. This
/// module defines the narrow contract the upload pipeline needs from such a
/// service and ships two implementations:
///
/// - [`ImageKitClient`]: the production client for ImageKit's upload API
/// - [`MemoryObjectStore`]: an in-process store for tests and local runs
///
/// # Contract
///
/// `upload` receives the path of a fully written staging file plus the
/// original file name, and returns the public URL and the name the store
/// assigned. A non-success answer from the remote service is an error
/// (`StorageError::Rejected`), never a "successful" `StoredObject`.
///
/// # Example
///
/// ```no_run
/// use feedhub_shared::storage::{MemoryObjectStore, ObjectStore, UploadRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryObjectStore::new("https://cdn.example.com");
///
/// let stored = store
///     .upload(UploadRequest {
///         path: "/tmp/feedhub-upload-abc.png".into(),
///         file_name: "cat.png".to_string(),
///         content_type: Some("image/png".to_string()),
///         tags: vec!["uploaded_via_feedhub".to_string()],
///     })
///     .await?;
///
/// println!("stored at {}", stored.url);
/// # Ok(())
/// # }
/// ```

pub mod imagekit;
pub mod memory;

pub use imagekit::{ImageKitClient, ImageKitConfig};
pub use memory::{MemoryObjectStore, MemoryStoreMode};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Object store error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading the staged file failed
    #[error("Failed to read staged file: {0}")]
    Io(#[from] std::io::Error),

    /// The request never got an HTTP answer
    #[error("Object store unreachable: {0}")]
    Transport(String),

    /// The store answered with a non-success status
    #[error("Object store rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The store answered 2xx but the body was not understood
    #[error("Unexpected object store response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed
    #[error("Object store misconfigured: {0}")]
    Configuration(String),
}

/// Object store result type alias
pub type StorageResult<T> = Result<T, StorageError>;

/// A file ready to be sent to the store
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Staged file on local disk
    pub path: PathBuf,

    /// Original client-side file name; the store makes it unique
    pub file_name: String,

    /// Declared content type, if the client sent one
    pub content_type: Option<String>,

    /// Provenance tags attached to the stored object
    pub tags: Vec<String>,
}

/// What the store kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Store-specific object ID
    pub file_id: String,

    /// Unique name assigned by the store
    pub name: String,

    /// Public URL of the object
    pub url: String,
}

/// Remote object store contract
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Sends a staged file to the store
    async fn upload(&self, request: UploadRequest) -> StorageResult<StoredObject>;
}

/// Builds `stem_suffix.ext` from an original file name
///
/// Mirrors the "unique file name" behavior of hosted stores so that
/// [`MemoryObjectStore`] produces realistic names.
pub(crate) fn unique_name(original: &str, suffix: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", original, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        assert_eq!(unique_name("cat.png", "x1"), "cat_x1.png");
        assert_eq!(unique_name("archive.tar.gz", "x1"), "archive.tar_x1.gz");
        assert_eq!(unique_name("README", "x1"), "README_x1");
        assert_eq!(unique_name(".hidden", "x1"), ".hidden_x1");
    }

    #[test]
    fn test_rejected_error_message() {
        let err = StorageError::Rejected {
            status: 403,
            message: "Your account cannot be authenticated.".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Object store rejected upload with status 403: Your account cannot be authenticated."
        );
    }
}
