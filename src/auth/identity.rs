//! Request identity.
//!
//! Two identity-proof mechanisms coexist: stateless access tokens and
//! store-backed session tokens. `AuthProof` is the tagged union of the
//! two; handlers depend on `resolve` and never on which mechanism
//! authenticated the request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use chrono::Utc;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::auth::Claims;
use crate::db::{DbPool, Session, User};
use crate::AppState;

pub enum AuthProof {
    /// Validated access-token claims; no store lookup was involved.
    Bearer(Claims),
    /// An active session row from the session store.
    SessionToken(Session),
}

impl AuthProof {
    /// Resolve the proof to the user it identifies against the primary
    /// store. An inactive or vanished user is indistinguishable from bad
    /// credentials.
    pub async fn resolve(&self, db: &DbPool) -> Result<User, ApiError> {
        let user: Option<User> = match self {
            AuthProof::Bearer(claims) => {
                sqlx::query_as("SELECT * FROM users WHERE email = ?")
                    .bind(&claims.sub)
                    .fetch_optional(db)
                    .await?
            }
            AuthProof::SessionToken(session) => {
                sqlx::query_as("SELECT * FROM users WHERE user_id = ?")
                    .bind(session.user_id)
                    .fetch_optional(db)
                    .await?
            }
        };

        match user {
            Some(user) if user.is_active => Ok(user),
            _ => Err(ApiError::unauthorized("Invalid or expired credentials")),
        }
    }
}

/// Extract the credential from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthProof {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing credentials"))?;

        // Access token first: no store lookup needed.
        if let Ok(claims) = state.tokens.validate(token) {
            return Ok(AuthProof::Bearer(claims));
        }

        // Otherwise treat it as an opaque session token.
        match state.sessions.get_by_token(token).await? {
            Some(session) if session.is_active(Utc::now()) => {
                Ok(AuthProof::SessionToken(session))
            }
            _ => Err(ApiError::unauthorized("Invalid or expired credentials")),
        }
    }
}
