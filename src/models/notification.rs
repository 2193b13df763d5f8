use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    LeftBehind,
    WeatherAlert,
    Custom,
}

impl Default for NotificationType {
    fn default() -> Self {
        NotificationType::LeftBehind
    }
}

impl NotificationType {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationType::LeftBehind => "Umbrella Left Behind!",
            NotificationType::WeatherAlert => "Weather Alert",
            NotificationType::Custom => "UmbraGuard Alert",
        }
    }
}

/// Immutable audit record of an alert attempt. Written exactly once per
/// dispatched alert, never updated or deleted here; retention is an
/// external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Body of the signed alert ingress. `type` defaults to `left_behind`; an
/// explicit `pushToken` overrides the stored target.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAlertRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[serde(alias = "umbrellaId")]
    #[validate(length(min = 1))]
    pub device_id: String,
    #[validate(length(min = 1))]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(alias = "fcmToken")]
    pub push_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertAccepted {
    pub success: bool,
    pub log_id: Uuid,
}
