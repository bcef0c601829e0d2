use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 内容核心对外发出的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotifyEvent {
    /// 文章已发布
    #[serde(rename_all = "camelCase")]
    PostPublished {
        post_name: String,
        slug: String,
        title: String,
        owner: String,
    },
    /// 需要向订阅者发送确认邮件
    #[serde(rename_all = "camelCase")]
    ConfirmationRequested { email: String, token: String },
}

impl NotifyEvent {
    pub fn reason(&self) -> &'static str {
        match self {
            NotifyEvent::PostPublished { .. } => "post-published",
            NotifyEvent::ConfirmationRequested { .. } => "confirmation-requested",
        }
    }
}

/// Notifier trait 是通知投递的外部接口
///
/// 投递是尽力而为的：调用方只记录失败，不回滚已提交的操作。
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: NotifyEvent) -> anyhow::Result<()>;
}
