//! Session endpoints: the store-backed login mechanism.
//!
//! The server derives the origin IP and device descriptor from the
//! request itself rather than trusting client-supplied values.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::db::{CreateSessionRequest, Session, User};
use crate::AppState;

use super::error::ApiError;

/// Extract the client IP from a request, checking proxy headers before
/// the socket address.
pub fn extract_client_ip(headers: &HeaderMap, conn_info: Option<&SocketAddr>) -> Option<String> {
    // Check X-Forwarded-For header first (comma-separated list, first is client)
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first_ip) = forwarded.split(',').next() {
            let ip = first_ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    // Check X-Real-IP header
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        let ip = real_ip.trim();
        if !ip.is_empty() {
            return Some(ip.to_string());
        }
    }

    // Fall back to connection info
    conn_info.map(|addr| addr.ip().to_string())
}

fn device_info(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Create a session for a user.
///
/// The user-existence check reads the primary store and the session
/// insert writes the session store; the two steps are not atomic. A user
/// deleted in between leaves a session row that no longer resolves — a
/// known limitation of the split-store layout.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
        .bind(req.user_id)
        .fetch_optional(&state.db)
        .await?;

    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let ip = extract_client_ip(&headers, Some(&addr)).unwrap_or_else(|| "unknown".to_string());
    let device = device_info(&headers);

    let session = state.sessions.create(req.user_id, &ip, &device).await?;

    tracing::info!(user_id = req.user_id, "Created session");

    Ok((StatusCode::CREATED, Json(session)))
}

/// Look up a session by its token. Expired sessions are reported as not
/// found, same as missing ones.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<Session>, ApiError> {
    match state.sessions.get_by_token(&token).await? {
        Some(session) if session.is_active(Utc::now()) => Ok(Json(session)),
        _ => Err(ApiError::not_found("Session not found")),
    }
}

/// Log out by deleting the session. Idempotent: a second call reports
/// not-found rather than erroring.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.delete(&token).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session not found"))
    }
}

/// List the currently-active sessions for a user.
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let sessions = state.sessions.list_active_for_user(user_id).await?;
    Ok(Json(sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionManager;
    use crate::config::Config;
    use axum::http::HeaderValue;
    use chrono::Duration;
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

    #[tokio::test]
    async fn test_get_session_roundtrip() {
        let state = test_state().await;
        let session = state
            .sessions
            .create(42, "10.0.0.5", "TestAgent/1.0")
            .await
            .unwrap();

        let Json(fetched) = get_session(State(state.clone()), Path(session.token.clone()))
            .await
            .unwrap();
        assert_eq!(fetched.user_id, 42);
        assert_eq!(fetched.ip_address, "10.0.0.5");
        assert_eq!(fetched.device_info, "TestAgent/1.0");
    }

    #[tokio::test]
    async fn test_get_session_hides_expired() {
        let state = test_state().await;

        // An already-expired row: present in the store, invisible here.
        let expired = SessionManager::new(state.session_db.clone(), Duration::seconds(-1));
        let session = expired.create(42, "10.0.0.5", "TestAgent/1.0").await.unwrap();
        assert!(state
            .sessions
            .get_by_token(&session.token)
            .await
            .unwrap()
            .is_some());

        assert!(get_session(State(state.clone()), Path(session.token)).await.is_err());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let state = test_state().await;
        let session = state.sessions.create(1, "127.0.0.1", "cli").await.unwrap();

        let status = logout(State(state.clone()), Path(session.token.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Second logout: not-found, never an error response with a 5xx.
        assert!(logout(State(state.clone()), Path(session.token)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_for_user_excludes_expired() {
        let state = test_state().await;
        let live = state.sessions.create(7, "10.0.0.1", "phone").await.unwrap();

        let expired = SessionManager::new(state.session_db.clone(), Duration::seconds(-1));
        expired.create(7, "10.0.0.2", "laptop").await.unwrap();

        let Json(active) = list_for_user(State(state.clone()), Path(7)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, live.token);
    }

    #[test]
    fn test_extract_client_ip_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.5, 172.16.0.1"),
        );
        assert_eq!(
            extract_client_ip(&headers, None),
            Some("10.0.0.5".to_string())
        );
    }

    #[test]
    fn test_extract_client_ip_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.9"));
        assert_eq!(
            extract_client_ip(&headers, None),
            Some("192.168.1.9".to_string())
        );
    }

    #[test]
    fn test_extract_client_ip_falls_back_to_socket() {
        let headers = HeaderMap::new();
        let addr: SocketAddr = "10.0.0.5:54321".parse().unwrap();
        assert_eq!(
            extract_client_ip(&headers, Some(&addr)),
            Some("10.0.0.5".to_string())
        );
        assert_eq!(extract_client_ip(&headers, None), None);
    }

    #[test]
    fn test_device_info_defaults_to_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(device_info(&headers), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("TestAgent/1.0"));
        assert_eq!(device_info(&headers), "TestAgent/1.0");
    }
}
