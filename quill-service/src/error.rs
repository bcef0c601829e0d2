use quill_api::extension::ExtensionError;
use quill_domain::CommentPhase;
use thiserror::Error;

/// 内容核心的错误类型
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("category {0} not found")]
    CategoryNotFound(String),

    #[error("category {id} would exceed the maximum depth of {max_depth}")]
    CategoryDepthExceeded { id: String, max_depth: usize },

    #[error("category {0} already exists")]
    DuplicateCategory(String),

    #[error("moving category {id} under {parent} would create a cycle")]
    CategoryCycle { id: String, parent: String },

    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("invalid series position: {0}")]
    InvalidSeriesPosition(String),

    #[error("no free slug derived from {base} after {attempts} attempts")]
    SlugExhausted { base: String, attempts: u32 },

    #[error("parent comment {parent} does not belong to post {post}")]
    CrossPostReply { parent: String, post: String },

    #[error("comment {id} was already moderated as {phase:?}")]
    AlreadyModerated { id: String, phase: CommentPhase },

    #[error("confirmation token is invalid or expired")]
    InvalidOrExpiredToken,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("storage error: {0}")]
    Storage(#[from] ExtensionError),
}

impl ContentError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ContentError::NotFound { kind, id: id.into() }
    }
}
