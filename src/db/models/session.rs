//! Session model.
//!
//! A session row is the server-side counterpart of an opaque bearer
//! credential: the token is the lookup key and the secret. Rows are
//! immutable once created; the only mutation is deletion (logout).
//! Expiry is lazy — a computed predicate, never a stored flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub session_id: i64,
    pub user_id: i64,
    pub token: String,
    pub ip_address: String,
    pub device_info: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Single source of truth for "active". Every read path that needs
    /// active semantics goes through here.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> Session {
        Session {
            session_id: 1,
            user_id: 42,
            token: "deadbeef".to_string(),
            ip_address: "10.0.0.5".to_string(),
            device_info: "TestAgent/1.0".to_string(),
            created_at: expires_at - Duration::hours(12),
            expires_at,
        }
    }

    #[test]
    fn test_is_active_before_expiry() {
        let now = Utc::now();
        let session = session_expiring_at(now + Duration::hours(1));
        assert!(session.is_active(now));
    }

    #[test]
    fn test_is_active_at_expiry_instant() {
        // Expiry is exclusive: a session is dead at exactly expires_at.
        let now = Utc::now();
        let session = session_expiring_at(now);
        assert!(!session.is_active(now));
    }

    #[test]
    fn test_is_active_after_expiry() {
        let now = Utc::now();
        let session = session_expiring_at(now - Duration::seconds(1));
        assert!(!session.is_active(now));
    }
}
