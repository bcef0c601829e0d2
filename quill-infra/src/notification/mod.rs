use quill_api::notification::{Notifier, NotifyEvent};
use async_trait::async_trait;

/// LoggingNotifier 只把事件写入日志
///
/// 未接入邮件等投递渠道时使用。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, event: NotifyEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&event)?;
        tracing::info!(reason = event.reason(), "Notification: {}", payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_notifier_accepts_events() {
        let notifier = LoggingNotifier;
        let event = NotifyEvent::ConfirmationRequested {
            email: "a@example.com".to_string(),
            token: "abc".to_string(),
        };
        assert!(notifier.notify(event).await.is_ok());
    }
}
