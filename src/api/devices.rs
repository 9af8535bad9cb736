//! Device endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::{CreateDeviceRequest, Device, Subscription, User};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_imei;

/// Register a device for a user
pub async fn create_device(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_imei(&req.imei_number) {
        errors.add("imei_number", e);
    }
    errors.finish()?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
        .bind(req.user_id)
        .fetch_optional(&state.db)
        .await?;
    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    if let Some(subscription_id) = req.subscription_id {
        let subscription: Option<Subscription> =
            sqlx::query_as("SELECT * FROM subscriptions WHERE subscription_id = ?")
                .bind(subscription_id)
                .fetch_optional(&state.db)
                .await?;
        if subscription.is_none() {
            return Err(ApiError::not_found("Subscription not found"));
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO devices (user_id, subscription_id, imei_number, device_type, model, status, added_on)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.user_id)
    .bind(req.subscription_id)
    .bind(&req.imei_number)
    .bind(&req.device_type)
    .bind(&req.model)
    .bind(&req.status)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    let device: Device = sqlx::query_as("SELECT * FROM devices WHERE device_id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(device)))
}

/// Get a device by id
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
) -> Result<Json<Device>, ApiError> {
    let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE device_id = ?")
        .bind(device_id)
        .fetch_optional(&state.db)
        .await?;

    device
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Device not found"))
}

/// List a user's devices
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Device>>, ApiError> {
    let devices: Vec<Device> = sqlx::query_as("SELECT * FROM devices WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(devices))
}
