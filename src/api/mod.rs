//! API layer
//!
//! HTTP handlers for:
//! - Account signup and login
//! - Bookmark listing, import, update and deletion
//! - Metrics (Prometheus)

mod bookmarks;
mod dto;
pub mod metrics;
mod users;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::AppState;
use crate::auth::require_auth;

pub use dto::*;
pub use metrics::{metrics_router, track_http_metrics};

/// Create API router
///
/// Routes are split into public and authenticated endpoints. The auth
/// middleware is attached with `route_layer`, so unknown paths still
/// answer 404 instead of 401.
pub fn api_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/login", post(users::login))
        .route("/signup", post(users::signup));

    let authenticated_routes = Router::new()
        .route(
            "/bookmarks",
            get(bookmarks::list_bookmarks).post(bookmarks::save_bookmark),
        )
        .route("/bookmarks/upload", post(bookmarks::upload_bookmarks))
        .route("/bookmarks/:id", delete(bookmarks::delete_bookmark))
        .merge(metrics_router())
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(authenticated_routes)
}
