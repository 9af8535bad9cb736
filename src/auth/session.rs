//! Server-side sessions.
//!
//! Sessions are the stateful, revocable counterpart to access tokens: an
//! opaque random token looked up in a dedicated store. A session moves
//! from active to expired by the clock alone (lazy expiry, no reaper
//! required) and to deleted only by explicit logout. Expired rows stay in
//! the store until the optional sweep removes them; read paths never
//! depend on the sweep.

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{debug, error};

use crate::db::{DbPool, Session};

/// Generate an opaque session token: 32 random bytes, hex-encoded.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Creates, looks up, lists, and revokes sessions against the session
/// store. All writes are committed before the call returns.
#[derive(Clone)]
pub struct SessionManager {
    db: DbPool,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(db: DbPool, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Create a session for `user_id` and return the full record,
    /// including the plaintext token. The token is the credential: it is
    /// returned to the caller once and never logged.
    pub async fn create(
        &self,
        user_id: i64,
        ip_address: &str,
        device_info: &str,
    ) -> Result<Session, sqlx::Error> {
        let token = generate_token();
        let created_at = Utc::now();
        let expires_at = created_at + self.ttl;

        sqlx::query(
            r#"
            INSERT INTO sessions (user_id, token, ip_address, device_info, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&token)
        .bind(ip_address)
        .bind(device_info)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        sqlx::query_as("SELECT * FROM sessions WHERE token = ?")
            .bind(&token)
            .fetch_one(&self.db)
            .await
    }

    /// Exact-match lookup. Does not filter by expiry: callers that need
    /// active semantics apply `Session::is_active` themselves.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.db)
            .await
    }

    /// Sessions for `user_id` that are active right now. Ordering is
    /// unspecified.
    pub async fn list_active_for_user(&self, user_id: i64) -> Result<Vec<Session>, sqlx::Error> {
        let sessions: Vec<Session> = sqlx::query_as("SELECT * FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        let now = Utc::now();
        Ok(sessions.into_iter().filter(|s| s.is_active(now)).collect())
    }

    /// Delete the session for `token`. Returns whether a row was removed;
    /// deleting a missing token is not an error.
    pub async fn delete(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove rows whose expiry has passed. Only the optional sweep calls
    /// this; lookups never rely on it.
    pub async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Spawn the periodic expired-session sweep.
    pub fn spawn_sweeper(&self, interval_secs: u64) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                match manager.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => debug!(purged, "Swept expired sessions"),
                    Err(e) => error!(error = %e, "Session sweep failed"),
                }
            }
        });
    }
}
