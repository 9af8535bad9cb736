//! Device models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    pub device_id: i64,
    pub user_id: i64,
    pub subscription_id: Option<i64>,
    pub imei_number: String,
    pub device_type: String,
    pub model: String,
    pub status: String,
    pub added_on: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub user_id: i64,
    pub subscription_id: Option<i64>,
    pub imei_number: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_device_status")]
    pub status: String,
}

fn default_device_status() -> String {
    "active".to_string()
}
