use quill_api::notification::{Notifier, NotifyEvent};
use std::sync::Arc;

/// 在后台任务中投递通知
///
/// 投递失败只记录警告，不影响已经提交的操作。
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn dispatch(&self, event: NotifyEvent) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let reason = event.reason();
            if let Err(e) = notifier.notify(event).await {
                tracing::warn!("Failed to deliver {} notification: {}", reason, e);
            }
        });
    }
}
