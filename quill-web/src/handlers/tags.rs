use axum::{extract::State, Json};
use quill_domain::Tag;
use crate::{ApiError, AppState};
use serde::Deserialize;

/// 解析标签请求
#[derive(Debug, Deserialize)]
pub struct ResolveTagsRequest {
    pub names: Vec<String>,
}

/// 解析标签名，缺失的标签会被创建
/// POST /api/v1alpha1/tags/-/resolve
pub async fn resolve_tags(
    State(state): State<AppState>,
    Json(request): Json<ResolveTagsRequest>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.tag_registry.resolve_all(&request.names).await?))
}

/// 列出Tags
/// GET /api/v1alpha1/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.tag_registry.list().await?))
}
