use async_trait::async_trait;
use quill_api::extension::{ExtensionClient, ExtensionError, ListOptions};
use quill_api::notification::NotifyEvent;
use quill_domain::newsletter::{constant, is_valid_email, normalize_email, Subscriber, SubscriberPhase};
use chrono::{Duration, Utc};
use crate::error::ContentError;
use crate::notification::NotificationDispatcher;
use crate::settings::ContentSettings;
use std::sync::Arc;

/// 订阅管理trait
#[async_trait]
pub trait SubscriptionManager: Send + Sync {
    /// 订阅，已订阅或待确认时直接返回现有记录
    async fn subscribe(&self, email: &str, name: Option<String>) -> Result<Subscriber, ContentError>;

    /// 使用确认令牌完成订阅
    async fn confirm(&self, token: &str) -> Result<Subscriber, ContentError>;

    /// 退订，对任何状态（包括从未订阅）都成功
    async fn unsubscribe(&self, email: &str) -> Result<Subscriber, ContentError>;

    async fn get(&self, email: &str) -> Result<Option<Subscriber>, ContentError>;

    /// 已确认、可以投递的订阅者
    async fn deliverable(&self) -> Result<Vec<Subscriber>, ContentError>;
}

pub struct DefaultSubscriptionManager<C: ExtensionClient> {
    client: Arc<C>,
    notifications: NotificationDispatcher,
    token_ttl: Duration,
    max_write_attempts: u32,
}

impl<C: ExtensionClient> DefaultSubscriptionManager<C> {
    pub fn new(client: Arc<C>, notifications: NotificationDispatcher, settings: &ContentSettings) -> Self {
        Self {
            client,
            notifications,
            token_ttl: settings.confirmation_token_ttl(),
            max_write_attempts: settings.max_write_attempts,
        }
    }

    fn normalized(email: &str) -> Result<String, ContentError> {
        let email = normalize_email(email);
        if is_valid_email(&email) {
            Ok(email)
        } else {
            Err(ContentError::InvalidEmail(email))
        }
    }

    async fn find(&self, email: &str) -> Result<Option<Subscriber>, ContentError> {
        Ok(self
            .client
            .fetch_by_unique_key::<Subscriber>(constant::SUBSCRIBER_EMAIL_INDEX, email)
            .await?)
    }

    fn request_confirmation(&self, subscriber: &Subscriber) {
        if let Some(token) = &subscriber.status.token {
            self.notifications.dispatch(NotifyEvent::ConfirmationRequested {
                email: subscriber.spec.email.clone(),
                token: token.value.clone(),
            });
        }
    }

    fn should_retry(&self, err: &ExtensionError, attempts: &mut u32) -> bool {
        if err.is_retryable() && *attempts < self.max_write_attempts {
            *attempts += 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl<C: ExtensionClient> SubscriptionManager for DefaultSubscriptionManager<C> {
    async fn subscribe(&self, email: &str, name: Option<String>) -> Result<Subscriber, ContentError> {
        let email = Self::normalized(email)?;
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let mut attempts = 0;
        loop {
            let result = match self.find(&email).await? {
                None => {
                    let mut subscriber = Subscriber::new(email.clone(), name.clone(), SubscriberPhase::Pending);
                    subscriber.issue_token();
                    self.client.create(subscriber).await
                }
                Some(mut subscriber) if subscriber.phase() == SubscriberPhase::Unsubscribed => {
                    subscriber.status.phase = SubscriberPhase::Pending;
                    subscriber.status.subscribed_at = Some(Utc::now());
                    subscriber.status.confirmed_at = None;
                    if name.is_some() {
                        subscriber.spec.name = name.clone();
                    }
                    subscriber.issue_token();
                    subscriber.sync_labels();
                    self.client.update(subscriber).await
                }
                Some(existing) => return Ok(existing),
            };

            match result {
                Ok(subscriber) => {
                    tracing::info!("Subscriber {} is pending confirmation", subscriber.id());
                    self.request_confirmation(&subscriber);
                    return Ok(subscriber);
                }
                Err(e) if self.should_retry(&e, &mut attempts) => {
                    tracing::debug!("Subscriber {} changed concurrently, retrying", email);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn confirm(&self, token: &str) -> Result<Subscriber, ContentError> {
        let mut attempts = 0;
        loop {
            let mut subscriber = self
                .client
                .fetch_by_unique_key::<Subscriber>(constant::SUBSCRIBER_TOKEN_INDEX, token)
                .await?
                .ok_or(ContentError::InvalidOrExpiredToken)?;

            let now = Utc::now();
            let usable = subscriber.phase() == SubscriberPhase::Pending
                && subscriber
                    .status
                    .token
                    .as_ref()
                    .is_some_and(|t| t.value == token && !t.is_expired(self.token_ttl, now));
            if !usable {
                return Err(ContentError::InvalidOrExpiredToken);
            }

            subscriber.status.phase = SubscriberPhase::Confirmed;
            subscriber.status.confirmed_at = Some(now);
            subscriber.status.token = None;
            subscriber.sync_labels();
            match self.client.update(subscriber).await {
                Ok(subscriber) => {
                    tracing::info!("Subscriber {} confirmed", subscriber.id());
                    return Ok(subscriber);
                }
                Err(e) if self.should_retry(&e, &mut attempts) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn unsubscribe(&self, email: &str) -> Result<Subscriber, ContentError> {
        let email = Self::normalized(email)?;

        let mut attempts = 0;
        loop {
            let result = match self.find(&email).await? {
                None => {
                    let subscriber = Subscriber::new(email.clone(), None, SubscriberPhase::Unsubscribed);
                    self.client.create(subscriber).await
                }
                Some(existing) if existing.phase() == SubscriberPhase::Unsubscribed => return Ok(existing),
                Some(mut subscriber) => {
                    subscriber.status.phase = SubscriberPhase::Unsubscribed;
                    subscriber.status.token = None;
                    subscriber.sync_labels();
                    self.client.update(subscriber).await
                }
            };

            match result {
                Ok(subscriber) => {
                    tracing::info!("Subscriber {} unsubscribed", subscriber.id());
                    return Ok(subscriber);
                }
                Err(e) if self.should_retry(&e, &mut attempts) => {
                    tracing::debug!("Subscriber {} changed concurrently, retrying", email);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn get(&self, email: &str) -> Result<Option<Subscriber>, ContentError> {
        self.find(&normalize_email(email)).await
    }

    async fn deliverable(&self) -> Result<Vec<Subscriber>, ContentError> {
        let selector = format!(
            "{}={}",
            constant::SUBSCRIBER_PHASE_LABEL,
            SubscriberPhase::Confirmed.as_str()
        );
        Ok(self
            .client
            .list::<Subscriber>(ListOptions::with_label_selector(selector))
            .await?
            .items)
    }
}
