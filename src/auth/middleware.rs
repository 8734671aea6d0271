//! Authentication middleware
//!
//! Protects routes that require a bearer token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use super::claims::Claims;
use super::verifier::Rejection;
use crate::AppState;
use crate::error::AppError;
use crate::metrics::TOKEN_REJECTIONS_TOTAL;

fn authorization_header(headers: &HeaderMap) -> &str {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
}

fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<Claims, Rejection> {
    state
        .verifier
        .verify_header(authorization_header(headers))
        .inspect_err(|rejection| {
            tracing::info!(reason = rejection.as_str(), "Bearer token rejected");
            TOKEN_REJECTIONS_TOTAL
                .with_label_values(&[rejection.as_str()])
                .inc();
        })
}

/// Middleware to require authentication
///
/// Verifies the bearer token and adds the full `Claims` to request
/// extensions for downstream handlers.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/bookmarks", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(request.headers(), &state)?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extractor for current authenticated user
///
/// Use in handlers to get the verified claims.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(claims): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", claims.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Reuse claims set by `require_auth`, verifying the header otherwise
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>().cloned() {
            return Ok(CurrentUser(claims));
        }

        let state = AppState::from_ref(state);
        let claims = authenticate(&parts.headers, &state)?;
        parts.extensions.insert(claims.clone());

        Ok(CurrentUser(claims))
    }
}
