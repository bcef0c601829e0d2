//! 测试用的存储和通知替身

use async_trait::async_trait;
use quill_api::notification::{Notifier, NotifyEvent};
use quill_infra::{MemoryExtensionRepository, ReactiveExtensionClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

pub fn memory_client() -> Arc<ReactiveExtensionClient> {
    Arc::new(ReactiveExtensionClient::new(Arc::new(MemoryExtensionRepository::new())))
}

/// 把收到的事件转发到channel
pub struct RecordingNotifier {
    sender: mpsc::UnboundedSender<NotifyEvent>,
}

pub struct RecordedEvents {
    receiver: Mutex<mpsc::UnboundedReceiver<NotifyEvent>>,
}

impl RecordedEvents {
    pub async fn next(&self) -> Option<NotifyEvent> {
        let mut receiver = self.receiver.lock().await;
        tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .ok()
            .flatten()
    }
}

pub fn recording_notifier() -> (Arc<RecordingNotifier>, RecordedEvents) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        Arc::new(RecordingNotifier { sender }),
        RecordedEvents {
            receiver: Mutex::new(receiver),
        },
    )
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: NotifyEvent) -> anyhow::Result<()> {
        self.sender.send(event)?;
        Ok(())
    }
}

/// 总是投递失败的通知器
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _event: NotifyEvent) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unavailable")
    }
}
