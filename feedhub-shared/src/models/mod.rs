/// Database models for FeedHub
///
/// # Models
///
/// - `user`: Accounts, credentials and status flags
/// - `post`: Uploaded media with caption and owner
///
/// # Example
///
/// ```no_run
/// use feedhub_shared::models::post::{CreatePost, MediaKind, Post};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let post = Post::create(
///     &pool,
///     CreatePost {
///         user_id: owner,
///         caption: "hi".to_string(),
///         url: "https://ik.imagekit.io/demo/cat_x1.png".to_string(),
///         file_type: MediaKind::from_content_type(Some("image/png")),
///         file_name: "cat_x1.png".to_string(),
///     },
/// )
/// .await?;
///
/// let feed = Post::list_newest_first(&pool).await?;
/// assert_eq!(feed[0].id, post.id);
/// # Ok(())
/// # }
/// ```

pub mod post;
pub mod user;
