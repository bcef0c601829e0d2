use axum::{
    extract::State,
    Json,
};
use chrono::{DateTime, Utc};
use quill_domain::{Subscriber, SubscriberPhase};
use crate::{ApiError, AppState};
use serde::{Deserialize, Serialize};

/// 订阅请求
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    pub name: Option<String>,
}

/// 确认订阅请求
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub token: String,
}

/// 退订请求
#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: String,
}

/// 订阅者信息（不包含确认令牌）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberInfo {
    pub name: String,
    pub email: String,
    pub display_name: Option<String>,
    pub phase: SubscriberPhase,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<&Subscriber> for SubscriberInfo {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            name: subscriber.metadata.name.clone(),
            email: subscriber.spec.email.clone(),
            display_name: subscriber.spec.name.clone(),
            phase: subscriber.status.phase,
            subscribed_at: subscriber.status.subscribed_at,
            confirmed_at: subscriber.status.confirmed_at,
        }
    }
}

/// 订阅
/// POST /api/v1alpha1/subscribers
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscriberInfo>, ApiError> {
    let subscriber = state.subscription_manager.subscribe(&request.email, request.name).await?;
    Ok(Json(SubscriberInfo::from(&subscriber)))
}

/// 确认订阅
/// POST /api/v1alpha1/subscribers/-/confirm
pub async fn confirm_subscription(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<SubscriberInfo>, ApiError> {
    let subscriber = state.subscription_manager.confirm(&request.token).await?;
    Ok(Json(SubscriberInfo::from(&subscriber)))
}

/// 退订
/// POST /api/v1alpha1/subscribers/-/unsubscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<SubscriberInfo>, ApiError> {
    let subscriber = state.subscription_manager.unsubscribe(&request.email).await?;
    Ok(Json(SubscriberInfo::from(&subscriber)))
}
