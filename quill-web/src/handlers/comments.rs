use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_domain::{Comment, ModerationDecision};
use quill_service::{CommentNode, CommentRequest};
use crate::{ApiError, AppState};
use serde::Deserialize;

/// 提交评论请求，文章ID来自路径
#[derive(Debug, Deserialize)]
pub struct SubmitCommentRequest {
    pub parent: Option<String>,
    pub author: String,
    pub body: String,
}

/// 审核请求
#[derive(Debug, Deserialize)]
pub struct ModerateCommentRequest {
    pub decision: ModerationDecision,
}

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    pub author: String,
}

/// 文章的评论树（仅已通过审核的）
/// GET /api/v1alpha1/posts/{id}/comments
pub async fn list_post_comments(
    State(state): State<AppState>,
    Path(post): Path<String>,
) -> Result<Json<Vec<CommentNode>>, ApiError> {
    Ok(Json(state.comment_manager.thread_of(&post).await?))
}

/// 提交评论
/// POST /api/v1alpha1/posts/{id}/comments
pub async fn submit_comment(
    State(state): State<AppState>,
    Path(post): Path<String>,
    Json(request): Json<SubmitCommentRequest>,
) -> Result<Response, ApiError> {
    let comment = state
        .comment_manager
        .submit(CommentRequest {
            post,
            parent: request.parent,
            author: request.author,
            body: request.body,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

/// 审核评论
/// PUT /api/v1alpha1/comments/{id}/moderation
pub async fn moderate_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ModerateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(state.comment_manager.moderate(&id, request.decision).await?))
}

/// 作者的待审核队列
/// GET /api/v1alpha1/comments/-/pending?author=
pub async fn pending_comments(
    State(state): State<AppState>,
    Query(params): Query<PendingParams>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.comment_manager.pending_queue_for(&params.author).await?))
}

/// 获取Comment
/// GET /api/v1alpha1/comments/{id}
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.comment_manager.get(&id).await? {
        Some(comment) => Ok(Json(comment).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// 删除Comment
/// DELETE /api/v1alpha1/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.comment_manager.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
