//! User endpoints: registration, CRUD, login, and the authenticated
//! `/me` view.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{password, AuthProof};
use crate::db::{
    CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, User, UserResponse,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_name, validate_password};

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

fn validate_create_request(req: &CreateUserRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }

    errors.finish()
}

/// Register a new user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_create_request(&req)?;

    let password_hash = password::hash_password(&req.password)
        .map_err(|_| ApiError::internal("Failed to hash password"))?;
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (name, email, phone, address, password_hash, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.address)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::conflict("A user with this email already exists")
        } else {
            tracing::error!("Failed to create user: {}", e);
            ApiError::database("Failed to create user")
        }
    })?;

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(user_id = user.user_id, "Created user");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// List users with skip/limit pagination
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let skip = page.skip.unwrap_or(0).max(0);
    let limit = page.limit.unwrap_or(100).clamp(1, 500);

    let users: Vec<User> = sqlx::query_as("SELECT * FROM users LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(skip)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a user by id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;

    user.map(|u| Json(u.into()))
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Update a user's profile fields
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        if let Err(e) = validate_name(name) {
            errors.add("name", e);
        }
    }
    if let Some(ref email) = req.email {
        if let Err(e) = validate_email(email) {
            errors.add("email", e);
        }
    }
    errors.finish()?;

    let _existing: User = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            address = COALESCE(?, address),
            updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.address)
    .bind(Utc::now())
    .bind(user_id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::conflict("A user with this email already exists")
        } else {
            tracing::error!("Failed to update user: {}", e);
            ApiError::database("Failed to update user")
        }
    })?;

    let user: User = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(user.into()))
}

/// Delete a user
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
        .bind(user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Login with email and password, returning a bearer access token.
///
/// User-not-found and wrong-password produce the same response so the
/// endpoint cannot be used to enumerate accounts.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    let Some(user) = user else {
        return Err(ApiError::unauthorized("Incorrect email or password"));
    };

    if !user.is_active || !password::verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Incorrect email or password"));
    }

    let token = state.tokens.issue(&user.email)?;

    Ok(Json(LoginResponse::bearer(token)))
}

/// Return the authenticated user's public fields. Accepts either identity
/// proof: a bearer access token or an active session token.
pub async fn me(
    State(state): State<Arc<AppState>>,
    proof: AuthProof,
) -> Result<Json<UserResponse>, ApiError> {
    let user = proof.resolve(&state.db).await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::response::IntoResponse;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_state() -> Arc<AppState> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::execute_sql(&db, include_str!("../../migrations/001_initial.sql"))
            .await
            .unwrap();

        let session_db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::execute_sql(&session_db, include_str!("../../migrations/002_sessions.sql"))
            .await
            .unwrap();

        let mut config = Config::default();
        config.auth.jwt_secret = Some("test-signing-secret".to_string());

        Arc::new(AppState::new(config, db, session_db).unwrap())
    }

    async fn register(state: &Arc<AppState>, email: &str, password: &str) -> UserResponse {
        let (status, Json(user)) = create_user(
            State(state.clone()),
            Json(CreateUserRequest {
                name: "Test User".to_string(),
                email: email.to_string(),
                phone: String::new(),
                address: String::new(),
                password: password.to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        user
    }

    async fn error_response(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let state = test_state().await;
        register(&state, "ada@example.com", "analytical1842").await;

        let Json(response) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "analytical1842".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.token_type, "bearer");
        let claims = state.tokens.validate(&response.access_token).unwrap();
        assert_eq!(claims.sub, "ada@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let state = test_state().await;
        register(&state, "ada@example.com", "analytical1842").await;

        let err = create_user(
            State(state.clone()),
            Json(CreateUserRequest {
                name: "Impostor".to_string(),
                email: "ada@example.com".to_string(),
                phone: String::new(),
                address: String::new(),
                password: "different-pw".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let (status, _) = error_response(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let state = test_state().await;
        register(&state, "ada@example.com", "analytical1842").await;

        let unknown_user = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever".to_string(),
            }),
        )
        .await
        .unwrap_err();
        let (unknown_status, unknown_body) = error_response(unknown_user).await;

        // Five wrong-password attempts: all identical, no lockout.
        for _ in 0..5 {
            let err = login(
                State(state.clone()),
                Json(LoginRequest {
                    email: "ada@example.com".to_string(),
                    password: "wrong-password".to_string(),
                }),
            )
            .await
            .unwrap_err();

            let (status, body) = error_response(err).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, unknown_body);
        }
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);

        // The account is not locked out.
        assert!(login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "analytical1842".to_string(),
            }),
        )
        .await
        .is_ok());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let state = test_state().await;
        let user = register(&state, "ada@example.com", "analytical1842").await;

        sqlx::query("UPDATE users SET is_active = 0 WHERE user_id = ?")
            .bind(user.user_id)
            .execute(&state.db)
            .await
            .unwrap();

        let err = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "analytical1842".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let (status, _) = error_response(err).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_resolves_both_proof_mechanisms() {
        let state = test_state().await;
        let user = register(&state, "ada@example.com", "analytical1842").await;

        // Bearer proof: claims from a validated access token.
        let token = state.tokens.issue("ada@example.com").unwrap();
        let claims = state.tokens.validate(&token).unwrap();
        let Json(via_bearer) = me(State(state.clone()), AuthProof::Bearer(claims))
            .await
            .unwrap();
        assert_eq!(via_bearer.user_id, user.user_id);

        // Session proof: an active row from the session store.
        let session = state
            .sessions
            .create(user.user_id, "10.0.0.5", "TestAgent/1.0")
            .await
            .unwrap();
        let Json(via_session) = me(State(state.clone()), AuthProof::SessionToken(session))
            .await
            .unwrap();
        assert_eq!(via_session.user_id, user.user_id);
        assert_eq!(via_session.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let state = test_state().await;
        let user = register(&state, "ada@example.com", "analytical1842").await;

        let Json(updated) = update_user(
            State(state.clone()),
            Path(user.user_id),
            Json(UpdateUserRequest {
                name: Some("Ada Lovelace".to_string()),
                email: None,
                phone: Some("555-0100".to_string()),
                address: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.phone, "555-0100");
        assert_eq!(updated.email, "ada@example.com");

        let status = delete_user(State(state.clone()), Path(user.user_id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_user(State(state.clone()), Path(user.user_id))
            .await
            .unwrap_err();
        let (status, _) = error_response(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
