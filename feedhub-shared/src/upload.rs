/// Upload staging and post publishing
///
/// An upload goes through two steps:
///
/// ```text
/// multipart field ──stage──> StagedUpload (temp file) ──publish──> ObjectStore ──> post row
/// ```
///
/// 1. [`StagedUpload::stage`] streams the incoming bytes into a temporary file
///    named `feedhub-upload-*<ext>`. The file belongs to the `StagedUpload`
///    value and is deleted when it drops, whichever way the request ends.
/// 2. [`publish_post`] sends the staged file to the object store and, once the
///    store has accepted it, inserts the `Post` row.
///
/// Every failure along the way is an [`UploadError`]. A database failure after
/// the store accepted the file leaves an orphaned remote object; it is logged
/// with its store ID but not cleaned up.

use bytes::Bytes;
use futures::{pin_mut, Stream, StreamExt};
use sqlx::PgPool;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::post::{CreatePost, MediaKind, Post};
use crate::storage::{ObjectStore, StorageError, UploadRequest};

/// Upload pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Creating or writing the staging file failed
    #[error("could not stage file: {0}")]
    Staging(#[from] std::io::Error),

    /// The client's body stream broke off mid-file
    #[error("could not read upload stream: {0}")]
    Stream(String),

    /// The object store did not keep the file
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// The post row could not be written
    #[error("could not record post: {0}")]
    Database(#[from] sqlx::Error),
}

/// Upload result type alias
pub type UploadResult<T> = Result<T, UploadError>;

/// A client file written to a scoped temporary file
///
/// Dropping the value removes the file.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    original_name: String,
    content_type: Option<String>,
    size: u64,
}

impl StagedUpload {
    /// Streams `chunks` into a new temporary file
    ///
    /// The file is created in `dir` (or the system temp directory) and keeps
    /// the extension of `original_name`. If any chunk fails, the partially
    /// written file is removed before the error is returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bytes::Bytes;
    /// use feedhub_shared::upload::StagedUpload;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let chunks = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(b"data"))]);
    /// let staged = StagedUpload::stage(None, "cat.png", Some("image/png".into()), chunks).await?;
    /// assert_eq!(staged.size(), 4);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn stage<S, E>(
        dir: Option<&Path>,
        original_name: &str,
        content_type: Option<String>,
        chunks: S,
    ) -> UploadResult<Self>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let suffix = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut builder = tempfile::Builder::new();
        builder.prefix("feedhub-upload-").suffix(&suffix);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let mut writer = tokio::fs::File::from_std(file.as_file().try_clone()?);
        let mut size = 0u64;

        pin_mut!(chunks);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| UploadError::Stream(e.to_string()))?;
            writer.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        writer.flush().await?;

        debug!(
            path = %file.path().display(),
            original_name,
            size_bytes = size,
            "Staged upload"
        );

        Ok(Self {
            file,
            original_name: original_name.to_string(),
            content_type,
            size,
        })
    }

    /// Location of the staging file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Client-side file name
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Declared content type, if any
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Bytes written
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Media kind derived from the declared content type
    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_content_type(self.content_type())
    }

    fn to_request(&self, tags: &[String]) -> UploadRequest {
        UploadRequest {
            path: PathBuf::from(self.path()),
            file_name: self.original_name.clone(),
            content_type: self.content_type.clone(),
            tags: tags.to_vec(),
        }
    }
}

/// Sends a staged file to the store and records the post
///
/// # Errors
///
/// - `UploadError::Storage` if the store rejects the file or cannot be reached
/// - `UploadError::Database` if the post row cannot be inserted
pub async fn publish_post(
    pool: &PgPool,
    store: &dyn ObjectStore,
    owner: Uuid,
    caption: String,
    staged: &StagedUpload,
    tags: &[String],
) -> UploadResult<Post> {
    let stored = store.upload(staged.to_request(tags)).await?;

    let post = Post::create(
        pool,
        CreatePost {
            user_id: owner,
            caption,
            url: stored.url.clone(),
            file_type: staged.media_kind(),
            file_name: stored.name.clone(),
        },
    )
    .await
    .map_err(|e| {
        warn!(
            store = store.name(),
            file_id = %stored.file_id,
            name = %stored.name,
            error = %e,
            "Stored object has no post row"
        );
        UploadError::Database(e)
    })?;

    info!(
        post_id = %post.id,
        user_id = %owner,
        file_type = %post.file_type,
        store = store.name(),
        "Post published"
    );

    Ok(post)
}
