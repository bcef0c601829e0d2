use quill_api::extension::{Extension, GroupVersionKind, Metadata, UniqueKey};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use validator::ValidateEmail;

/// 订阅相关的常量
pub mod constant {
    pub const GROUP: &str = "newsletter.quill.run";
    pub const VERSION: &str = "v1alpha1";

    pub const SUBSCRIBER_KIND: &str = "Subscriber";
    pub const SUBSCRIBER_PHASE_LABEL: &str = "newsletter.quill.run/phase";
    pub const SUBSCRIBER_EMAIL_INDEX: &str = "subscriber.spec.email";
    pub const SUBSCRIBER_TOKEN_INDEX: &str = "subscriber.status.token";
}

/// Subscriber扩展对象
/// 邮件订阅者，email在规范化后全局唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub metadata: Metadata,
    pub spec: SubscriberSpec,
    #[serde(default)]
    pub status: SubscriberStatus,
}

impl Extension for Subscriber {
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::new(constant::GROUP, constant::VERSION, constant::SUBSCRIBER_KIND)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::new(constant::SUBSCRIBER_EMAIL_INDEX, &self.spec.email)];
        if let Some(token) = &self.status.token {
            keys.push(UniqueKey::new(constant::SUBSCRIBER_TOKEN_INDEX, &token.value));
        }
        keys
    }
}

impl Subscriber {
    /// 创建订阅者，email需已规范化
    pub fn new(email: impl Into<String>, name: Option<String>, phase: SubscriberPhase) -> Self {
        let mut subscriber = Self {
            metadata: Metadata::generate(),
            spec: SubscriberSpec {
                email: email.into(),
                name,
            },
            status: SubscriberStatus {
                phase,
                subscribed_at: Some(Utc::now()),
                ..SubscriberStatus::default()
            },
        };
        subscriber.sync_labels();
        subscriber
    }

    pub fn id(&self) -> &str {
        &self.metadata.name
    }

    pub fn phase(&self) -> SubscriberPhase {
        self.status.phase
    }

    /// 签发新的确认令牌，旧令牌随之失效
    pub fn issue_token(&mut self) -> &ConfirmationToken {
        self.status.token.insert(ConfirmationToken::generate())
    }

    pub fn sync_labels(&mut self) {
        let phase = self.status.phase;
        self.metadata.set_label(constant::SUBSCRIBER_PHASE_LABEL, phase.as_str());
    }
}

/// 规范化email：去掉首尾空白并整体转小写
pub fn normalize_email(input: &str) -> String {
    input.trim().to_lowercase()
}

/// 检查email语法是否合法
pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

/// Subscriber规格
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberSpec {
    pub email: String,
    pub name: Option<String>,
}

/// Subscriber状态
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberStatus {
    pub phase: SubscriberPhase,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    /// 当前有效的确认令牌，确认后清空
    pub token: Option<ConfirmationToken>,
}

/// 订阅状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriberPhase {
    #[default]
    Pending,
    Confirmed,
    Unsubscribed,
}

impl SubscriberPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberPhase::Pending => "PENDING",
            SubscriberPhase::Confirmed => "CONFIRMED",
            SubscriberPhase::Unsubscribed => "UNSUBSCRIBED",
        }
    }
}

/// 确认令牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

impl ConfirmationToken {
    /// 生成随机令牌
    pub fn generate() -> Self {
        Self {
            value: uuid::Uuid::new_v4().simple().to_string(),
            issued_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.issued_at > ttl
    }
}
