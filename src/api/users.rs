//! Signup and login endpoints

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};

use super::dto::{CredentialsRequest, MessageResponse, TokenResponse};
use crate::AppState;
use crate::error::AppError;
use crate::service::AccountService;

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(state.db.clone(), state.config.auth.clone())
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(request) = payload?;

    account_service(&state)
        .signup(&request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created".to_string(),
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let Json(request) = payload?;

    let token = account_service(&state)
        .login(&request.email, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
