//! Image existence check and image serving

use axum::{
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ImageStatus {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// GET /api/image/*path
pub async fn image_status(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Json<ImageStatus> {
    let exists = state.images.locate(&path).await.is_some();
    Json(ImageStatus {
        exists,
        path: exists.then_some(path),
    })
}

/// GET /images/*path
///
/// Content type follows the file extension; range requests are honored.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> ApiResult<Response> {
    let resolved = state
        .images
        .locate(&path)
        .await
        .ok_or_else(|| ApiError::NotFound(path.clone()))?;

    let response = ServeFile::new(resolved)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.into_response())
}
