//! Subscription plan endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::{CreatePlanRequest, Plan, PlanResponse};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_name;

fn validate_create_request(req: &CreatePlanRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    if req.price < 0.0 {
        errors.add("price", "Price must not be negative");
    }
    if req.duration_days <= 0 {
        errors.add("duration_days", "Duration must be positive");
    }

    errors.finish()
}

/// Create a plan
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanResponse>), ApiError> {
    validate_create_request(&req)?;

    let features = req
        .features
        .as_ref()
        .map(|f| serde_json::to_string(f))
        .transpose()
        .map_err(|_| ApiError::bad_request("Invalid features payload"))?;

    let result = sqlx::query(
        r#"
        INSERT INTO plans (product_id, name, price, duration_days, features, is_active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.product_id)
    .bind(&req.name)
    .bind(req.price)
    .bind(req.duration_days)
    .bind(&features)
    .bind(req.is_active)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    let plan: Plan = sqlx::query_as("SELECT * FROM plans WHERE plan_id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(plan.into())))
}

/// Get a plan by id
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i64>,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan: Option<Plan> = sqlx::query_as("SELECT * FROM plans WHERE plan_id = ?")
        .bind(plan_id)
        .fetch_optional(&state.db)
        .await?;

    plan.map(|p| Json(p.into()))
        .ok_or_else(|| ApiError::not_found("Plan not found"))
}
