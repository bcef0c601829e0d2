use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_api::extension::ExtensionError;
use quill_service::ContentError;
use serde_json::json;

/// 把服务层错误转换为HTTP响应
#[derive(Debug)]
pub struct ApiError(pub ContentError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ContentError::NotFound { .. } | ContentError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            ContentError::DuplicateCategory(_)
            | ContentError::CategoryCycle { .. }
            | ContentError::AlreadyModerated { .. }
            | ContentError::SlugExhausted { .. } => StatusCode::CONFLICT,
            ContentError::InvalidCategory(_)
            | ContentError::CategoryDepthExceeded { .. }
            | ContentError::InvalidTagName(_)
            | ContentError::InvalidSeriesPosition(_)
            | ContentError::CrossPostReply { .. }
            | ContentError::InvalidOrExpiredToken
            | ContentError::InvalidEmail(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ContentError::Storage(ExtensionError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ContentError::Storage(e) if e.is_retryable() => StatusCode::CONFLICT,
            ContentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
