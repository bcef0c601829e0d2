use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_domain::Series;
use quill_service::SeriesRequest;
use crate::{ApiError, AppState};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CompleteSeriesRequest {
    pub completed: bool,
}

/// 创建Series
/// POST /api/v1alpha1/series
pub async fn create_series(
    State(state): State<AppState>,
    Json(request): Json<SeriesRequest>,
) -> Result<Response, ApiError> {
    let series = state.series_organizer.create_series(request).await?;
    Ok((StatusCode::CREATED, Json(series)).into_response())
}

/// 获取Series
/// GET /api/v1alpha1/series/{id}
pub async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.series_organizer.get_series(&id).await? {
        Some(series) => Ok(Json(series).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// 按位置排列的文章ID
/// GET /api/v1alpha1/series/{id}/posts
pub async fn series_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.series_organizer.ordered(&id).await?))
}

/// 标记系列完结
/// PUT /api/v1alpha1/series/{id}/completed
pub async fn complete_series(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CompleteSeriesRequest>,
) -> Result<Json<Series>, ApiError> {
    Ok(Json(state.series_organizer.set_completed(&id, request.completed).await?))
}
