//! Subscription plan models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub plan_id: i64,
    pub product_id: i64,
    pub name: String,
    pub price: f64,
    pub duration_days: i64,
    /// JSON-encoded feature list, stored as TEXT.
    pub features: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Plan view with the feature blob decoded back into JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan_id: i64,
    pub product_id: i64,
    pub name: String,
    pub price: f64,
    pub duration_days: i64,
    pub features: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        let features = plan
            .features
            .as_deref()
            .and_then(|f| serde_json::from_str(f).ok());
        Self {
            plan_id: plan.plan_id,
            product_id: plan.product_id,
            name: plan.name,
            price: plan.price,
            duration_days: plan.duration_days,
            features,
            is_active: plan.is_active,
            created_at: plan.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub product_id: i64,
    pub name: String,
    pub price: f64,
    pub duration_days: i64,
    pub features: Option<serde_json::Value>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}
