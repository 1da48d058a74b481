/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use feedhub_api::{app::AppState, config::Config};
/// use feedhub_shared::storage::ImageKitClient;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let store = Arc::new(ImageKitClient::new(config.imagekit_config())?);
/// let state = AppState::new(pool, config, store);
/// let app = feedhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use feedhub_shared::auth::middleware::{authenticate, extract_bearer_token};
use feedhub_shared::storage::ObjectStore;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Remote object store for uploaded media
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            store,
        }
    }

    /// Secret for access tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.tokens.access_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /hello                      # Greeting (public)
/// ├── GET  /health                     # Health check (public)
/// ├── /auth/
/// │   ├── POST /jwt/login              # Form login (public)
/// │   ├── POST /jwt/logout             # (bearer)
/// │   ├── POST /register
/// │   ├── POST /forgot-password
/// │   ├── POST /reset-password
/// │   ├── POST /request-verify-token
/// │   └── GET|POST /verify
/// ├── /users/                          # (bearer)
/// │   ├── GET|PATCH /me
/// │   └── GET|PATCH /:id               # superuser only
/// ├── POST   /upload                   # (bearer) multipart file + caption
/// ├── GET    /feeds                    # (bearer)
/// └── DELETE /posts/:post_id           # (bearer) owner only
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Authentication (per-route basis)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public, no auth
    let public_routes = Router::new()
        .route("/hello", get(routes::health::hello))
        .route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/jwt/login", post(routes::auth::login))
        .route("/register", post(routes::auth::register))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password))
        .route("/request-verify-token", post(routes::auth::request_verify_token))
        .route(
            "/verify",
            get(routes::auth::verify_from_query).post(routes::auth::verify),
        );

    // Require JWT authentication
    let logout_routes = Router::new()
        .route("/jwt/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let user_routes = Router::new()
        .route(
            "/me",
            get(routes::users::get_me).patch(routes::users::update_me),
        )
        .route(
            "/:id",
            get(routes::users::get_user).patch(routes::users::update_user),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let post_routes = Router::new()
        .route(
            "/upload",
            post(routes::posts::upload)
                .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes)),
        )
        .route("/feeds", get(routes::posts::feeds))
        .route("/posts/:post_id", delete(routes::posts::delete_post))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(post_routes)
        .nest("/auth", auth_routes.merge(logout_routes))
        .nest("/users", user_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Resolves the bearer token to an active user, then injects the
/// `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers())?;
    let auth_context = authenticate(&state.db, state.jwt_secret(), token).await?;

    tracing::debug!(user_id = %auth_context.user_id, "Authenticated request");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
