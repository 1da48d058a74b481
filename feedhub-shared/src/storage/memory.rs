/// In-memory object store
///
/// Keeps uploaded files in process memory and hands out URLs under a fixed
/// base. It reads the staged file exactly like a real client would, so a
/// pipeline bug that deletes the staging file too early still surfaces as an
/// error here.
///
/// The [`MemoryStoreMode`] switch simulates the two failure classes of a
/// remote store: a non-success answer and an unreachable service.
///
/// # Example
///
/// ```
/// use feedhub_shared::storage::{MemoryObjectStore, MemoryStoreMode};
///
/// let store = MemoryObjectStore::new("https://cdn.test");
/// store.set_mode(MemoryStoreMode::Reject { status: 500 });
/// assert_eq!(store.object_count(), 0);
/// ```

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use super::{unique_name, ObjectStore, StorageError, StorageResult, StoredObject, UploadRequest};

/// How the store answers uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryStoreMode {
    /// Keep the file and succeed
    #[default]
    Accept,

    /// Answer with a non-success status
    Reject { status: u16 },

    /// Fail before any answer
    Unreachable,
}

/// One object kept by the store
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub stored: StoredObject,
    pub original_name: String,
    pub content_type: Option<String>,
    pub tags: Vec<String>,
    pub bytes: Vec<u8>,
}

/// Object store backed by a `Vec` behind a mutex
#[derive(Debug)]
pub struct MemoryObjectStore {
    base_url: String,
    mode: Mutex<MemoryStoreMode>,
    objects: Mutex<Vec<MemoryObject>>,
}

impl MemoryObjectStore {
    /// Creates an accepting store serving URLs under `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mode: Mutex::new(MemoryStoreMode::Accept),
            objects: Mutex::new(Vec::new()),
        }
    }

    /// Changes how subsequent uploads are answered
    pub fn set_mode(&self, mode: MemoryStoreMode) {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    /// Number of objects kept so far
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of every kept object, oldest first
    pub fn objects(&self) -> Vec<MemoryObject> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(&self, request: UploadRequest) -> StorageResult<StoredObject> {
        let mode = *self.mode.lock().unwrap_or_else(|e| e.into_inner());

        match mode {
            MemoryStoreMode::Accept => {}
            MemoryStoreMode::Reject { status } => {
                return Err(StorageError::Rejected {
                    status,
                    message: "Upload rejected by memory store".to_string(),
                });
            }
            MemoryStoreMode::Unreachable => {
                return Err(StorageError::Transport(
                    "memory store is unreachable".to_string(),
                ));
            }
        }

        let bytes = tokio::fs::read(&request.path).await?;

        let file_id = Uuid::new_v4().simple().to_string();
        let name = unique_name(&request.file_name, &file_id[..8]);
        let stored = StoredObject {
            url: format!("{}/{}", self.base_url, name),
            name,
            file_id,
        };

        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MemoryObject {
                stored: stored.clone(),
                original_name: request.file_name,
                content_type: request.content_type,
                tags: request.tags,
                bytes,
            });

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn request_for(path: &std::path::Path) -> UploadRequest {
        UploadRequest {
            path: path.to_path_buf(),
            file_name: "cat.png".to_string(),
            content_type: Some("image/png".to_string()),
            tags: vec!["uploaded_via_feedhub".to_string()],
        }
    }

    #[tokio::test]
    async fn test_accepts_and_keeps_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"png-bytes").unwrap();

        let store = MemoryObjectStore::new("https://cdn.test/");
        let stored = store.upload(request_for(file.path())).await.unwrap();

        assert!(stored.name.starts_with("cat_"));
        assert!(stored.name.ends_with(".png"));
        assert_eq!(stored.url, format!("https://cdn.test/{}", stored.name));

        let objects = store.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].bytes, b"png-bytes");
        assert_eq!(objects[0].tags, vec!["uploaded_via_feedhub".to_string()]);
    }

    #[tokio::test]
    async fn test_unique_names_per_upload() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = MemoryObjectStore::new("https://cdn.test");

        let a = store.upload(request_for(file.path())).await.unwrap();
        let b = store.upload(request_for(file.path())).await.unwrap();

        assert_ne!(a.name, b.name);
        assert_ne!(a.file_id, b.file_id);
    }

    #[tokio::test]
    async fn test_reject_mode() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = MemoryObjectStore::new("https://cdn.test");
        store.set_mode(MemoryStoreMode::Reject { status: 500 });

        let result = store.upload(request_for(file.path())).await;

        assert!(matches!(result, Err(StorageError::Rejected { status: 500, .. })));
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_mode() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = MemoryObjectStore::new("https://cdn.test");
        store.set_mode(MemoryStoreMode::Unreachable);

        let result = store.upload(request_for(file.path())).await;
        assert!(matches!(result, Err(StorageError::Transport(_))));
    }

    #[tokio::test]
    async fn test_missing_staged_file() {
        let store = MemoryObjectStore::new("https://cdn.test");

        let result = store
            .upload(request_for(std::path::Path::new("/nonexistent/staged.png")))
            .await;

        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
