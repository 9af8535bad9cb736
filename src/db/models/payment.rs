//! Payment models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: i64,
    pub user_id: i64,
    pub subscription_id: Option<i64>,
    pub amount: f64,
    pub payment_method: String,
    pub status: String,
    pub transaction_id: String,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub user_id: i64,
    pub subscription_id: Option<i64>,
    pub amount: f64,
    pub payment_method: String,
    #[serde(default = "default_payment_status")]
    pub status: String,
    /// Generated server-side when absent.
    pub transaction_id: Option<String>,
}

fn default_payment_status() -> String {
    "pending".to_string()
}
