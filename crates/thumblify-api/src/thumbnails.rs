use axum::{
    Extension, Json,
    extract::{Path, State},
};
use thumblify_types::api::{
    GenerateThumbnailRequest, GenerateThumbnailResponse, MessageResponse, ThumbnailListResponse,
    ThumbnailResponse,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiJson, GenerateError};
use crate::middleware::CurrentUser;
use crate::state::AppState;

const NOT_FOUND: &str = "Thumbnail not found";

/// Runs the whole pipeline inline; responds once the image is stored.
pub async fn generate(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Result<ApiJson<GenerateThumbnailRequest>, ApiError>,
) -> Result<Json<GenerateThumbnailResponse>, GenerateError> {
    let ApiJson(req) = body?;
    let thumbnail = state.thumbnails.generate(current.id, req).await?;
    Ok(Json(GenerateThumbnailResponse {
        success: true,
        thumbnail,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if !state.thumbnails.delete(current.id, id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.into()));
    }
    Ok(Json(MessageResponse::new("Thumbnail deleted successfully")))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ThumbnailListResponse>, ApiError> {
    let thumbnails = state.thumbnails.list(current.id).await?;
    Ok(Json(ThumbnailListResponse { thumbnails }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ThumbnailResponse>, ApiError> {
    let id = parse_id(&id)?;
    let thumbnail = state
        .thumbnails
        .get(current.id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))?;
    Ok(Json(ThumbnailResponse { thumbnail }))
}

/// Ids that cannot name a record are treated as missing records.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(NOT_FOUND.into()))
}
