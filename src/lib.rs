//! Kwikportal - bookmark storage backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Signup / login                                           │
//! │  - Bookmark endpoints (bearer token required)               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Accounts, token issuance                                 │
//! │  - Bookmark import and editing                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Moka listing cache                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `import`: Browser bookmark export parser
//! - `data`: Database and cache layer
//! - `auth`: JWT issuance and verification, password hashing
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod import;
pub mod metrics;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the database pool and caches.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Per-user bookmark listings (volatile)
    pub cache: Arc<data::BookmarkCache>,

    /// Bearer token verifier built from `config.auth`
    pub verifier: Arc<auth::ClaimsVerifier>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Initialize caches
    /// 3. Build token verifier
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        metrics::USERS_TOTAL.set(db.count_users().await?);
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Initialize caches
        let cache = data::BookmarkCache::new(
            config.cache.bookmark_lists_max_users,
            Duration::from_secs(config.cache.ttl_seconds),
        );
        tracing::info!("Caches initialized");

        // 3. Build token verifier
        if config.auth.enforce_expiration && config.auth.token_ttl_seconds.is_none() {
            tracing::warn!("auth.enforce_expiration is set but issued tokens carry no expiration");
        }
        let verifier = auth::ClaimsVerifier::new(&config.auth);

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            cache: Arc::new(cache),
            verifier: Arc::new(verifier),
        })
    }
}

/// Extra room for multipart framing on top of `upload.max_bytes`
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit, middleware};
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
    };

    let body_limit = state
        .config
        .upload
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::api_router(state.clone()))
        .layer(middleware::from_fn(api::track_http_metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
