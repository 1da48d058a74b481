/// Authentication endpoints
///
/// This module provides the account lifecycle endpoints:
/// - Login / logout with bearer tokens
/// - Registration
/// - Password reset (forgot + reset)
/// - Email verification (request + verify)
///
/// # Endpoints
///
/// - `POST /auth/jwt/login` - Form login, returns a bearer token
/// - `POST /auth/jwt/logout` - Bearer-protected, stateless no-op
/// - `POST /auth/register` - Create an account
/// - `POST /auth/forgot-password` - Issue a reset token
/// - `POST /auth/reset-password` - Consume a reset token
/// - `POST /auth/request-verify-token` - Issue a verification token
/// - `GET|POST /auth/verify` - Consume a verification token
///
/// Flow failures are `400` responses whose message is a stable code such as
/// `LOGIN_BAD_CREDENTIALS`. Token delivery is logged rather than mailed.

use crate::{
    app::AppState,
    error::{is_duplicate_email, validation_errors, ApiError, ApiResult},
    routes::users::UserRead,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Form, Json,
};
use feedhub_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, UpdateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login form (`application/x-www-form-urlencoded`)
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Email address
    pub username: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,
}

/// Register request
///
/// Privileged flags in the body are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Body for the token request endpoints
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Verification token, from a JSON body or a query string
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /auth/jwt/login
/// Content-Type: application/x-www-form-urlencoded
///
/// username=user@example.com&password=SecureP@ss123
/// ```
///
/// # Response
///
/// ```json
/// { "access_token": "eyJ...", "token_type": "bearer" }
/// ```
///
/// # Errors
///
/// - `400 LOGIN_BAD_CREDENTIALS`: Unknown email, wrong password or inactive account
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<LoginResponse>> {
    let bad_credentials = || ApiError::BadRequest("LOGIN_BAD_CREDENTIALS".to_string());

    let user = match User::find_by_email(&state.db, form.username.trim()).await? {
        Some(user) => user,
        None => {
            // Same hashing cost as the wrong-password path
            let _ = password::hash_password(&form.password);
            return Err(bad_credentials());
        }
    };

    if !password::verify_password(&form.password, &user.hashed_password)? {
        tracing::debug!(user_id = %user.id, "Login with wrong password");
        return Err(bad_credentials());
    }

    if !user.is_active {
        tracing::debug!(user_id = %user.id, "Login for inactive user");
        return Err(bad_credentials());
    }

    let access_token = jwt::create_access_token(
        user.id,
        state.jwt_secret(),
        state.config.tokens.access_lifetime_seconds,
    )?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Logout endpoint
///
/// Tokens are stateless, so this only confirms the token is still valid.
pub async fn logout(Extension(auth): Extension<AuthContext>) -> StatusCode {
    tracing::info!(user_id = %auth.user_id, "User logged out");
    StatusCode::NO_CONTENT
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "SecureP@ss123" }
/// ```
///
/// # Errors
///
/// - `400 REGISTER_USER_ALREADY_EXISTS`: Email taken
/// - `400 REGISTER_INVALID_PASSWORD`: Password fails the policy
/// - `422 Unprocessable Entity`: Malformed email
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserRead>)> {
    req.validate().map_err(validation_errors)?;

    if let Err(reason) = password::validate_password(&req.password, &req.email) {
        tracing::debug!(%reason, "Rejected registration password");
        return Err(ApiError::BadRequest("REGISTER_INVALID_PASSWORD".to_string()));
    }

    let already_exists = || ApiError::BadRequest("REGISTER_USER_ALREADY_EXISTS".to_string());

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(already_exists());
    }

    let hashed_password = password::hash_password(&req.password)?;

    let user = match User::create(&state.db, CreateUser::new(req.email, hashed_password)).await {
        Ok(user) => user,
        Err(e) if is_duplicate_email(&e) => return Err(already_exists()),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Starts the password reset flow
///
/// Always answers `202 Accepted` so the endpoint cannot be used to probe for
/// accounts. For an active account, a reset token is issued and logged.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<StatusCode> {
    req.validate().map_err(validation_errors)?;

    if let Some(user) = User::find_by_email(&state.db, &req.email).await? {
        if user.is_active {
            let token = jwt::create_reset_password_token(
                user.id,
                &user.hashed_password,
                &state.config.tokens.reset_password_secret,
            )?;

            tracing::info!(user_id = %user.id, %token, "Password reset requested");
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// Consumes a reset token and sets a new password
///
/// # Errors
///
/// - `400 RESET_PASSWORD_BAD_TOKEN`: Invalid, expired or already used token
/// - `400 RESET_PASSWORD_INVALID_PASSWORD`: Password fails the policy
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<UserRead>> {
    let bad_token = || ApiError::BadRequest("RESET_PASSWORD_BAD_TOKEN".to_string());

    let claims = jwt::validate_reset_password_token(
        &req.token,
        &state.config.tokens.reset_password_secret,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected reset token");
        bad_token()
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(bad_token)?;

    // The password changed since the token was issued
    if !claims.matches_password(&user.hashed_password) {
        return Err(bad_token());
    }

    if let Err(reason) = password::validate_password(&req.password, &user.email) {
        tracing::debug!(user_id = %user.id, %reason, "Rejected reset password");
        return Err(ApiError::BadRequest(
            "RESET_PASSWORD_INVALID_PASSWORD".to_string(),
        ));
    }

    let update = UpdateUser {
        hashed_password: Some(password::hash_password(&req.password)?),
        ..Default::default()
    };
    let user = User::update(&state.db, user.id, update)
        .await?
        .ok_or_else(bad_token)?;

    tracing::info!(user_id = %user.id, "Password reset");

    Ok(Json(user.into()))
}

/// Issues an email verification token
///
/// Always answers `202 Accepted`. A token is issued and logged only for an
/// active, unverified account.
pub async fn request_verify_token(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<StatusCode> {
    req.validate().map_err(validation_errors)?;

    if let Some(user) = User::find_by_email(&state.db, &req.email).await? {
        if user.is_active && !user.is_verified {
            let token = jwt::create_verification_token(
                user.id,
                &user.email,
                &state.config.tokens.verification_secret,
            )?;

            tracing::info!(user_id = %user.id, %token, "Verification requested");
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// `POST /auth/verify` with `{"token": "..."}`
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<UserRead>> {
    verify_token(&state, &req.token).await.map(Json)
}

/// `GET /auth/verify?token=...`, the form used in emailed links
pub async fn verify_from_query(
    State(state): State<AppState>,
    Query(req): Query<VerifyRequest>,
) -> ApiResult<Json<UserRead>> {
    verify_token(&state, &req.token).await.map(Json)
}

/// Marks the token's account as verified
///
/// # Errors
///
/// - `400 VERIFY_USER_BAD_TOKEN`: Invalid token, unknown user, or the account
///   email changed since the token was issued
/// - `400 VERIFY_USER_ALREADY_VERIFIED`
async fn verify_token(state: &AppState, token: &str) -> ApiResult<UserRead> {
    let bad_token = || ApiError::BadRequest("VERIFY_USER_BAD_TOKEN".to_string());

    let claims = jwt::validate_verification_token(token, &state.config.tokens.verification_secret)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected verification token");
            bad_token()
        })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(bad_token)?;

    if !user.email.eq_ignore_ascii_case(&claims.email) {
        return Err(bad_token());
    }

    if user.is_verified {
        return Err(ApiError::BadRequest(
            "VERIFY_USER_ALREADY_VERIFIED".to_string(),
        ));
    }

    let update = UpdateUser {
        is_verified: Some(true),
        ..Default::default()
    };
    let user = User::update(&state.db, user.id, update)
        .await?
        .ok_or_else(bad_token)?;

    tracing::info!(user_id = %user.id, "User verified");

    Ok(user.into())
}
