use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_domain::Category;
use quill_service::{CategoryPostCount, CategoryRequest};
use crate::{ApiError, AppState};
use serde::Deserialize;

/// 修改父分类请求，`parent` 为空表示移到根
#[derive(Debug, Deserialize)]
pub struct MoveCategoryRequest {
    pub parent: Option<String>,
}

/// 创建Category
/// POST /api/v1alpha1/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> Result<Response, ApiError> {
    let category = state.category_tree.create(request).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// 列出Categories
/// GET /api/v1alpha1/categories
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.category_tree.list().await?))
}

/// 各分类的已发布文章数
/// GET /api/v1alpha1/categories/-/post-counts
pub async fn category_post_counts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryPostCount>>, ApiError> {
    Ok(Json(state.post_store.category_counts().await?))
}

/// 获取Category
/// GET /api/v1alpha1/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.category_tree.get(&id).await? {
        Some(category) => Ok(Json(category).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// 面包屑路径
/// GET /api/v1alpha1/categories/{id}/path
pub async fn category_path(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.category_tree.path_of(&id).await?))
}

/// 移动Category
/// PUT /api/v1alpha1/categories/{id}/parent
pub async fn move_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MoveCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let parent = request.parent.as_deref().filter(|p| !p.is_empty());
    Ok(Json(state.category_tree.move_to(&id, parent).await?))
}
