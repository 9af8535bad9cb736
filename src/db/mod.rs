pub mod models;

pub use models::*;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::config::Config;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
pub(crate) async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

async fn connect(db_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    Ok(pool)
}

/// Initialize the primary store (users, plans, subscriptions, devices,
/// payments).
pub async fn init(config: &Config) -> Result<DbPool> {
    let db_url = config.main_db_url();
    info!("Initializing primary store");

    let pool = connect(&db_url).await?;
    execute_sql(&pool, include_str!("../../migrations/001_initial.sql")).await?;

    info!("Primary store initialized");
    Ok(pool)
}

/// Initialize the session store. Sessions live in their own database and
/// never share a pool with the primary store.
pub async fn init_session_store(config: &Config) -> Result<DbPool> {
    let db_url = config.session_db_url();
    info!("Initializing session store");

    let pool = connect(&db_url).await?;
    execute_sql(&pool, include_str!("../../migrations/002_sessions.sql")).await?;

    info!("Session store initialized");
    Ok(pool)
}
