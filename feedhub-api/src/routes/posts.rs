/// Post endpoints
///
/// # Endpoints
///
/// - `POST /upload` - Multipart `file` + `caption`; stores the file and creates a post
/// - `GET /feeds` - Every post, newest first, annotated for the caller
/// - `DELETE /posts/:post_id` - Owner-only delete
///
/// # Upload flow
///
/// ```text
/// multipart ──> staging file ──> object store ──> post row ──> 201
///                    └──────── removed on every exit path ────────┘
/// ```
///
/// Any failure after the request was accepted (staging, store, database) is a
/// `500` whose message starts with `File upload failed:`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use feedhub_shared::{
    auth::middleware::AuthContext,
    models::post::Post,
    upload::{publish_post, StagedUpload},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One feed entry
///
/// `email` is the caller's address on every entry, not the post owner's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub caption: String,
    pub url: String,
    pub file_type: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_owner: bool,
    pub email: String,
}

impl FeedItem {
    fn for_caller(post: Post, caller: &AuthContext) -> Self {
        Self {
            is_owner: caller.owns(post.user_id),
            email: caller.email.clone(),
            id: post.id,
            user_id: post.user_id,
            caption: post.caption,
            url: post.url,
            file_type: post.file_type,
            file_name: post.file_name,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Feed response
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<FeedItem>,
}

/// Delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub post_id: String,
}

/// Upload a media file
///
/// # Endpoint
///
/// ```text
/// POST /upload
/// Authorization: Bearer eyJ...
/// Content-Type: multipart/form-data; boundary=...
///
/// file=<bytes; filename="cat.png"; content-type=image/png>
/// caption=My cat
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `400 Bad Request`: Malformed multipart framing
/// - `422 Unprocessable Entity`: `file` or `caption` field missing
/// - `500 upload_failed`: Body over `MAX_UPLOAD_BYTES`, or a staging, object
///   store or database failure
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let tmp_dir = state.config.storage.tmp_dir.as_deref();

    let mut staged: Option<StagedUpload> = None;
    let mut caption: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if staged.is_none() => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                staged = Some(StagedUpload::stage(tmp_dir, &file_name, content_type, field).await?);
            }
            Some("caption") if caption.is_none() => {
                caption = Some(field.text().await.map_err(multipart_error)?);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring multipart field");
            }
        }
    }

    let (staged, caption) = match (staged, caption) {
        (Some(staged), Some(caption)) => (staged, caption),
        (staged, caption) => {
            let mut details = Vec::new();
            if staged.is_none() {
                details.push(ValidationErrorDetail::new("file", "Field required"));
            }
            if caption.is_none() {
                details.push(ValidationErrorDetail::new("caption", "Field required"));
            }
            return Err(ApiError::ValidationError(details));
        }
    };

    let post = publish_post(
        &state.db,
        state.store.as_ref(),
        auth.user_id,
        caption,
        &staged,
        std::slice::from_ref(&state.config.storage.upload_tag),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Lists every post, newest first
///
/// # Response
///
/// ```json
/// {
///   "posts": [
///     {
///       "id": "uuid", "user_id": "uuid", "caption": "My cat",
///       "url": "https://ik.imagekit.io/...", "file_type": "image",
///       "file_name": "cat_x1.png", "created_at": "...", "updated_at": "...",
///       "is_owner": true, "email": "caller@example.com"
///     }
///   ]
/// }
/// ```
pub async fn feeds(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<FeedResponse>> {
    let posts = Post::list_newest_first(&state.db)
        .await?
        .into_iter()
        .map(|post| FeedItem::for_caller(post, &auth))
        .collect();

    Ok(Json(FeedResponse { posts }))
}

/// Deletes one of the caller's posts
///
/// # Errors
///
/// - `404 Not Found`: No such post
/// - `403 Forbidden`: Post belongs to someone else
/// - `500 Internal Server Error`: `post_id` is not a UUID, or the database
///   failed; the body carries `Error deleting post: <cause>`
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let post_id = Uuid::parse_str(&post_id).map_err(delete_failure)?;

    let not_found = || ApiError::NotFound("Post not found".to_string());

    let post = Post::find_by_id(&state.db, post_id)
        .await
        .map_err(delete_failure)?
        .ok_or_else(not_found)?;

    if !auth.owns(post.user_id) {
        tracing::warn!(%post_id, user_id = %auth.user_id, "Delete attempted by non-owner");
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this post".to_string(),
        ));
    }

    // Lost a race with another delete of the same post
    if !Post::delete(&state.db, post_id).await.map_err(delete_failure)? {
        return Err(not_found());
    }

    tracing::info!(%post_id, user_id = %auth.user_id, "Post deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: "Post deleted".to_string(),
        post_id: post_id.to_string(),
    }))
}

fn delete_failure(err: impl std::fmt::Display) -> ApiError {
    ApiError::DeleteFailed(err.to_string())
}

/// Over-limit bodies are upload failures; anything else is a malformed request
fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::UploadFailed(err.body_text());
    }
    ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(user_id: Uuid) -> AuthContext {
        AuthContext {
            user_id,
            email: "caller@example.com".to_string(),
            is_superuser: false,
            is_verified: true,
        }
    }

    fn post_by(user_id: Uuid) -> Post {
        Post {
            id: Uuid::new_v4(),
            user_id,
            caption: "hello".to_string(),
            url: "https://cdn.test/cat_x1.png".to_string(),
            file_type: "image".to_string(),
            file_name: "cat_x1.png".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_feed_item_for_owner() {
        let me = Uuid::new_v4();
        let item = FeedItem::for_caller(post_by(me), &caller(me));

        assert!(item.is_owner);
        assert_eq!(item.email, "caller@example.com");
    }

    #[test]
    fn test_feed_item_uses_callers_email() {
        let item = FeedItem::for_caller(post_by(Uuid::new_v4()), &caller(Uuid::new_v4()));

        assert!(!item.is_owner);
        assert_eq!(item.email, "caller@example.com");
    }

    #[test]
    fn test_malformed_post_id_is_delete_failure() {
        let err = Uuid::parse_str("not-a-uuid").map_err(delete_failure).unwrap_err();

        match err {
            ApiError::DeleteFailed(cause) => assert!(!cause.is_empty()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_delete_response_shape() {
        let id = Uuid::new_v4();
        let body = serde_json::to_value(DeleteResponse {
            success: true,
            message: "Post deleted".to_string(),
            post_id: id.to_string(),
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"success": true, "message": "Post deleted", "post_id": id.to_string()})
        );
    }
}
