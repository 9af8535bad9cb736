pub mod api;
pub mod auth;
pub mod config;
pub mod db;

pub use db::DbPool;

use anyhow::{Context, Result};
use chrono::Duration;
use config::Config;

use crate::auth::{SessionManager, TokenIssuer};

pub struct AppState {
    pub config: Config,
    /// Primary store: users, plans, subscriptions, devices, payments.
    pub db: DbPool,
    /// Session store. Separate database; no operation spans both stores
    /// in one transaction.
    pub session_db: DbPool,
    pub tokens: TokenIssuer,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, session_db: DbPool) -> Result<Self> {
        let secret = config
            .auth
            .jwt_secret
            .as_deref()
            .context("auth.jwt_secret is not set")?;

        let tokens = TokenIssuer::new(
            secret,
            Duration::minutes(config.auth.access_token_ttl_minutes),
        );
        let sessions = SessionManager::new(
            session_db.clone(),
            Duration::hours(config.auth.session_ttl_hours),
        );

        Ok(Self {
            config,
            db,
            session_db,
            tokens,
            sessions,
        })
    }
}
