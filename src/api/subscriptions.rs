//! Subscription endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::{CreateSubscriptionRequest, Plan, Subscription, User};
use crate::AppState;

use super::error::ApiError;

/// Create a subscription linking a user to a plan
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
        .bind(req.user_id)
        .fetch_optional(&state.db)
        .await?;
    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let plan: Option<Plan> = sqlx::query_as("SELECT * FROM plans WHERE plan_id = ?")
        .bind(req.plan_id)
        .fetch_optional(&state.db)
        .await?;
    if plan.is_none() {
        return Err(ApiError::not_found("Plan not found"));
    }

    if req.end_date <= req.start_date {
        return Err(ApiError::validation_field(
            "end_date",
            "End date must be after start date",
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO subscriptions (user_id, plan_id, start_date, end_date, status, renewal_type, payment_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.user_id)
    .bind(req.plan_id)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(&req.status)
    .bind(&req.renewal_type)
    .bind(req.payment_id)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    let subscription: Subscription =
        sqlx::query_as("SELECT * FROM subscriptions WHERE subscription_id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&state.db)
            .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// Get a subscription by id
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Path(subscription_id): Path<i64>,
) -> Result<Json<Subscription>, ApiError> {
    let subscription: Option<Subscription> =
        sqlx::query_as("SELECT * FROM subscriptions WHERE subscription_id = ?")
            .bind(subscription_id)
            .fetch_optional(&state.db)
            .await?;

    subscription
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Subscription not found"))
}
