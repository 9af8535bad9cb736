//! Payment endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{CreatePaymentRequest, Payment, User};
use crate::AppState;

use super::error::ApiError;

/// Record a payment
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    if req.amount <= 0.0 {
        return Err(ApiError::validation_field(
            "amount",
            "Amount must be positive",
        ));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
        .bind(req.user_id)
        .fetch_optional(&state.db)
        .await?;
    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let transaction_id = req
        .transaction_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO payments (user_id, subscription_id, amount, payment_method, status, transaction_id, payment_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.user_id)
    .bind(req.subscription_id)
    .bind(req.amount)
    .bind(&req.payment_method)
    .bind(&req.status)
    .bind(&transaction_id)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    let payment: Payment = sqlx::query_as("SELECT * FROM payments WHERE payment_id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Get a payment by id
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<i64>,
) -> Result<Json<Payment>, ApiError> {
    let payment: Option<Payment> = sqlx::query_as("SELECT * FROM payments WHERE payment_id = ?")
        .bind(payment_id)
        .fetch_optional(&state.db)
        .await?;

    payment
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Payment not found"))
}
