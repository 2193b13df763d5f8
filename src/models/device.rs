use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Last reported connectivity snapshot for a device. Only the current
/// snapshot is stored; the upsert hands the previous one to the trigger
/// listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub device_id: String,
    pub connected: bool,
    pub last_updated: DateTime<Utc>,
}

/// Pairing record created at registration time. At most one owner per
/// device id, first writer wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOwnership {
    pub device_id: String,
    pub user_id: String,
    pub registered_at: DateTime<Utc>,
}

// `umbrellaId` is accepted as an alias on the wire: deployed firmware still
// reports under the old field name.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatusRequest {
    #[serde(alias = "umbrellaId")]
    #[validate(length(min = 1))]
    pub device_id: String,
    pub connected: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    #[serde(alias = "umbrellaId")]
    #[validate(length(min = 1))]
    pub device_id: String,
    #[validate(length(min = 1))]
    pub user_id: String,
}
