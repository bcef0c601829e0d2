use thiserror::Error;

/// ExtensionError 是存储层返回的错误
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// 唯一索引冲突，调用方应在本地重试
    #[error("unique index {index} already holds value {value}")]
    Conflict { index: String, value: String },

    /// 乐观锁检查失败
    #[error("extension {name} was modified concurrently")]
    VersionMismatch { name: String },

    #[error("extension {name} not found")]
    NotFound { name: String },

    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(String),
}

impl ExtensionError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ExtensionError::Conflict { .. })
    }

    /// 是否为可重试的并发冲突（唯一索引冲突或版本冲突）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtensionError::Conflict { .. } | ExtensionError::VersionMismatch { .. }
        )
    }

    pub fn conflict_index(&self) -> Option<&str> {
        match self {
            ExtensionError::Conflict { index, .. } => Some(index),
            _ => None,
        }
    }
}
