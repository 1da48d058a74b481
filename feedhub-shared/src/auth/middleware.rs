/// Request authentication for Axum
///
/// Resolves the caller's identity from an `Authorization: Bearer <token>`
/// header: the token is validated as an access token, the user row is loaded,
/// and inactive users are rejected. The result is an [`AuthContext`] that the
/// API layer inserts into request extensions.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use feedhub_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.email)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::User;

/// Authenticated identity attached to each protected request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email of the authenticated user
    pub email: String,

    /// Whether the user may manage other accounts
    pub is_superuser: bool,

    /// Whether the user's email has been verified
    pub is_verified: bool,
}

impl AuthContext {
    /// Builds the context from a loaded user row
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
        }
    }

    /// Whether this identity owns a resource belonging to `owner_id`
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token is valid but the user is gone or deactivated
    #[error("Inactive or unknown user")]
    InactiveUser,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            JwtError::WrongPurpose { .. } => {
                AuthError::InvalidToken("Token not valid for authentication".to_string())
            }
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

/// Pulls the bearer token out of the `Authorization` header
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    Ok(token.trim())
}

/// Resolves an access token into the caller's identity
///
/// # Errors
///
/// - `AuthError::InvalidToken` if the token fails validation
/// - `AuthError::InactiveUser` if the user no longer exists or is inactive
/// - `AuthError::DatabaseError` if the user lookup fails
pub async fn authenticate(pool: &PgPool, secret: &str, token: &str) -> Result<AuthContext, AuthError> {
    let claims = validate_access_token(token, secret)?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::InactiveUser)?;

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "Rejected token for inactive user");
        return Err(AuthError::InactiveUser);
    }

    Ok(AuthContext::from_user(&user))
}
