//! Bookmark endpoints
//!
//! All handlers act on the bookmarks of the authenticated caller.

use axum::{
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};

use super::dto::SuccessResponse;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{Bookmark, BookmarkUpdate};
use crate::error::AppError;
use crate::service::BookmarkService;

/// Multipart field carrying the browser export
const UPLOAD_FIELD: &str = "bookmarkFile";

fn bookmark_service(state: &AppState) -> BookmarkService {
    BookmarkService::new(
        state.db.clone(),
        state.cache.clone(),
        state.config.upload.clone(),
    )
}

/// GET /bookmarks
pub async fn list_bookmarks(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Bookmark>>, AppError> {
    let bookmarks = bookmark_service(&state).list(user.user_id()).await?;
    Ok(Json(Vec::clone(&bookmarks)))
}

/// POST /bookmarks/upload
pub async fn upload_bookmarks(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    let max_size = state.config.upload.max_bytes;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?
        {
            if bytes.len() + chunk.len() > max_size {
                return Err(AppError::Validation(format!(
                    "File too large: exceeds {} bytes",
                    max_size
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_data = Some(bytes);
    }

    let file_data = file_data.ok_or_else(|| {
        AppError::Validation(format!("No file provided in field `{UPLOAD_FIELD}`"))
    })?;

    bookmark_service(&state)
        .import(user.user_id(), file_data)
        .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new("ok"))))
}

/// POST /bookmarks
pub async fn save_bookmark(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<BookmarkUpdate>, JsonRejection>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    let Json(update) = payload?;

    bookmark_service(&state)
        .save(user.user_id(), update)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Bookmark saved")),
    ))
}

/// DELETE /bookmarks/:id
pub async fn delete_bookmark(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    bookmark_service(&state)
        .delete(user.user_id(), &id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Bookmark deleted")),
    ))
}
