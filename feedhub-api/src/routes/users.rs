/// User account endpoints
///
/// # Endpoints
///
/// - `GET /users/me` - The caller's account
/// - `PATCH /users/me` - Change the caller's email and/or password
/// - `GET /users/:id` - Any account (superuser only)
/// - `PATCH /users/:id` - Edit any account, including flags (superuser only)
///
/// Changing the email resets `is_verified`; the new address has to be
/// verified again.

use crate::{
    app::AppState,
    error::{is_duplicate_email, validation_errors, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use feedhub_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{UpdateUser, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRead {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
        }
    }
}

/// Self-service update; any other field in the body is ignored
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdateRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,
}

/// Superuser update
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminUserUpdateRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserRead>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    Ok(Json(user.into()))
}

/// Updates the caller's email and/or password
///
/// # Errors
///
/// - `400 UPDATE_USER_EMAIL_ALREADY_EXISTS`: Email belongs to another account
/// - `400 UPDATE_USER_INVALID_PASSWORD`: Password fails the policy
/// - `422 Unprocessable Entity`: Malformed email
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UserUpdateRequest>,
) -> ApiResult<Json<UserRead>> {
    req.validate().map_err(validation_errors)?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let update = build_update(&state, &user, req.email, req.password).await?;
    let user = apply_update(&state, user, update).await?;

    Ok(Json(user.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserRead>> {
    let user = find_for_superuser(&state, &auth, &id).await?;
    Ok(Json(user.into()))
}

/// Edits any account, including its flags
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a superuser
/// - `404 Not Found`: No such user
/// - `400` codes as for `PATCH /users/me`
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<AdminUserUpdateRequest>,
) -> ApiResult<Json<UserRead>> {
    let user = find_for_superuser(&state, &auth, &id).await?;
    req.validate().map_err(validation_errors)?;

    let mut update = build_update(&state, &user, req.email, req.password).await?;
    if req.is_active.is_some() {
        update.is_active = req.is_active;
    }
    if req.is_superuser.is_some() {
        update.is_superuser = req.is_superuser;
    }
    if req.is_verified.is_some() {
        update.is_verified = req.is_verified;
    }

    let user = apply_update(&state, user, update).await?;
    tracing::info!(user_id = %user.id, by = %auth.user_id, "User updated by superuser");

    Ok(Json(user.into()))
}

async fn find_for_superuser(state: &AppState, auth: &AuthContext, id: &str) -> ApiResult<User> {
    if !auth.is_superuser {
        return Err(ApiError::Forbidden("Superuser privileges required".to_string()));
    }

    let not_found = || ApiError::NotFound("User not found".to_string());
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;

    User::find_by_id(&state.db, id).await?.ok_or_else(not_found)
}

/// Turns requested email/password changes into a checked `UpdateUser`
async fn build_update(
    state: &AppState,
    user: &User,
    email: Option<String>,
    new_password: Option<String>,
) -> ApiResult<UpdateUser> {
    let mut update = UpdateUser::default();

    if let Some(email) = email {
        if !email.eq_ignore_ascii_case(&user.email) {
            if let Some(existing) = User::find_by_email(&state.db, &email).await? {
                if existing.id != user.id {
                    return Err(ApiError::BadRequest(
                        "UPDATE_USER_EMAIL_ALREADY_EXISTS".to_string(),
                    ));
                }
            }
            update.email = Some(email);
            update.is_verified = Some(false);
        }
    }

    if let Some(new_password) = new_password {
        let email = update.email.as_deref().unwrap_or(&user.email);
        if let Err(reason) = password::validate_password(&new_password, email) {
            tracing::debug!(user_id = %user.id, %reason, "Rejected password update");
            return Err(ApiError::BadRequest("UPDATE_USER_INVALID_PASSWORD".to_string()));
        }
        update.hashed_password = Some(password::hash_password(&new_password)?);
    }

    Ok(update)
}

async fn apply_update(state: &AppState, user: User, update: UpdateUser) -> ApiResult<User> {
    if update.is_empty() {
        return Ok(user);
    }

    match User::update(&state.db, user.id, update).await {
        Ok(Some(updated)) => Ok(updated),
        Ok(None) => Err(ApiError::NotFound("User not found".to_string())),
        Err(e) if is_duplicate_email(&e) => Err(ApiError::BadRequest(
            "UPDATE_USER_EMAIL_ALREADY_EXISTS".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}
