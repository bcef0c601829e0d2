use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use quill_api::extension::{ListResult, Metadata};
use quill_domain::{Post, PostPhase, PostSpec};
use quill_service::{LikeOutcome, PostDraft, PostQuery, SeriesNavigation};
use crate::{ApiError, AppState};
use serde::{Deserialize, Serialize};

/// 修改正文请求
#[derive(Debug, Deserialize)]
pub struct EditBodyRequest {
    pub body: String,
}

/// 点赞请求
#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct RelatedParams {
    pub limit: Option<usize>,
}

/// 归档页查询参数
#[derive(Debug, Deserialize)]
pub struct ArchiveParams {
    pub year: i32,
    pub month: Option<u32>,
}

/// 对外返回的Post，点赞只暴露数量
#[derive(Debug, Serialize)]
pub struct PostView {
    pub metadata: Metadata,
    pub spec: PostSpec,
    pub status: PostStatusView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStatusView {
    pub phase: PostPhase,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time_minutes: u32,
    pub views: u64,
    pub like_count: usize,
    pub last_modify_time: Option<DateTime<Utc>>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        let like_count = post.like_count();
        Self {
            metadata: post.metadata,
            spec: post.spec,
            status: PostStatusView {
                phase: post.status.phase,
                published_at: post.status.published_at,
                reading_time_minutes: post.status.reading_time_minutes,
                views: post.status.views,
                like_count,
                last_modify_time: post.status.last_modify_time,
            },
        }
    }
}

fn views(posts: Vec<Post>) -> Vec<PostView> {
    posts.into_iter().map(PostView::from).collect()
}

const DEFAULT_RELATED_LIMIT: usize = 5;

/// 发布Post
/// POST /api/v1alpha1/posts
pub async fn publish_post(
    State(state): State<AppState>,
    Json(draft): Json<PostDraft>,
) -> Result<Response, ApiError> {
    let post = state.post_store.publish(draft).await?;
    Ok((StatusCode::CREATED, Json(PostView::from(post))).into_response())
}

/// 列出Posts
/// GET /api/v1alpha1/posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<ListResult<PostView>>, ApiError> {
    let posts = state.post_store.list(query).await?;
    Ok(Json(posts.map(PostView::from)))
}

/// 获取Post
/// GET /api/v1alpha1/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.post_store.get(&id).await? {
        Some(post) => Ok(Json(PostView::from(post)).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// 按slug获取Post
/// GET /api/v1alpha1/posts/-/slug/{slug}
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    match state.post_store.get_by_slug(&slug).await? {
        Some(post) => Ok(Json(PostView::from(post)).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// 修改正文
/// PUT /api/v1alpha1/posts/{id}/body
pub async fn edit_post_body(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EditBodyRequest>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.post_store.edit_body(&id, &request.body).await?.into()))
}

/// 归档Post
/// PUT /api/v1alpha1/posts/{id}/archive
pub async fn archive_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.post_store.archive(&id).await?.into()))
}

/// 记录一次浏览
/// PUT /api/v1alpha1/posts/{id}/views
pub async fn record_post_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.post_store.record_view(&id).await?.into()))
}

/// 切换点赞
/// PUT /api/v1alpha1/posts/{id}/likes
pub async fn toggle_post_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ToggleLikeRequest>,
) -> Result<Json<LikeOutcome>, ApiError> {
    Ok(Json(state.post_store.toggle_like(&id, &request.user).await?))
}

/// 相关文章
/// GET /api/v1alpha1/posts/{id}/related
pub async fn related_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<RelatedParams>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    Ok(Json(views(state.post_store.related(&id, limit).await?)))
}

/// 系列中的前后文章
/// GET /api/v1alpha1/posts/{id}/navigation
pub async fn post_navigation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SeriesNavigation>, ApiError> {
    Ok(Json(state.series_organizer.navigation(&id).await?))
}

/// 按年月归档
/// GET /api/v1alpha1/posts/-/archive?year=&month=
pub async fn archive_index(
    State(state): State<AppState>,
    Query(params): Query<ArchiveParams>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    Ok(Json(views(state.post_store.archive_index(params.year, params.month).await?)))
}
