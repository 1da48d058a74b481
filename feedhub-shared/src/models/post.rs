/// Post model and database operations
///
/// A post is one uploaded media file (image or video) plus a caption. Posts
/// are created only after the object store has accepted the file, and are
/// never edited afterwards; the only mutation is deletion by the owner.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE post (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
///     caption TEXT NOT NULL,
///     url TEXT NOT NULL,
///     file_type VARCHAR(16) NOT NULL CHECK (file_type IN ('image', 'video')),
///     file_name TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of media stored for a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies an upload by its declared content type
    ///
    /// `video/*` is a video; everything else, including a missing content
    /// type, is treated as an image.
    ///
    /// # Example
    ///
    /// ```
    /// use feedhub_shared::models::post::MediaKind;
    ///
    /// assert_eq!(MediaKind::from_content_type(Some("video/mp4")), MediaKind::Video);
    /// assert_eq!(MediaKind::from_content_type(Some("image/png")), MediaKind::Image);
    /// assert_eq!(MediaKind::from_content_type(None), MediaKind::Image);
    /// ```
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("video/") => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("Unknown media kind: {}", other)),
        }
    }
}

/// A stored post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,

    /// Owner of the post
    pub user_id: Uuid,

    /// Caption text (may be empty)
    pub caption: String,

    /// Public URL returned by the object store
    pub url: String,

    /// "image" or "video"
    pub file_type: String,

    /// Name the object store assigned to the file
    pub file_name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Parsed `file_type`
    pub fn media_kind(&self) -> Result<MediaKind, String> {
        self.file_type.parse()
    }
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub user_id: Uuid,
    pub caption: String,
    pub url: String,
    pub file_type: MediaKind,
    pub file_name: String,
}

impl Post {
    /// Inserts a post
    ///
    /// # Errors
    ///
    /// Fails with a foreign-key violation if `user_id` does not exist.
    pub async fn create(pool: &PgPool, data: CreatePost) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO post (user_id, caption, url, file_type, file_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, caption, url, file_type, file_name, created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.caption)
        .bind(data.url)
        .bind(data.file_type.as_str())
        .bind(data.file_name)
        .fetch_one(pool)
        .await
    }

    /// Finds a post by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, caption, url, file_type, file_name, created_at, updated_at
            FROM post
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Every post, newest first
    ///
    /// Ties on `created_at` are broken by `id` so the order is total.
    pub async fn list_newest_first(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, caption, url, file_type, file_name, created_at, updated_at
            FROM post
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Deletes a post; returns false if it did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM post WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
