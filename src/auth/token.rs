//! Stateless access tokens.
//!
//! Tokens are compact HS256 JWTs carrying a subject claim and an expiry.
//! Validation is signature + expiry only; there is no store lookup and no
//! revocation list, so a token stays valid for its full TTL even after
//! logout.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature mismatch, malformed token, or past expiry. The variants
    /// are deliberately collapsed so callers cannot tell them apart.
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user's email.
    pub sub: String,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

/// Mints and validates access tokens. Built once at startup from the
/// configured signing secret; request handlers never touch the secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token for `subject` with the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_with_ttl(subject, self.ttl)
    }

    /// Issue a token with an explicit TTL.
    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Validate a token and return its claims.
    ///
    /// Fails closed: any signature mismatch, malformed token, or expired
    /// token yields `Invalid`, never partial claims. Expiry is exclusive
    /// of the issue instant, so a zero-TTL token is already dead.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }
}
