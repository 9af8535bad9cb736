use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Connection string for the primary store. Defaults to a SQLite file
    /// under `server.data_dir` when unset.
    pub main_url: Option<String>,
    /// Connection string for the session store. The session store is a
    /// separate database and never shares a connection with the primary.
    pub session_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Symmetric secret for signing access tokens. There is intentionally
    /// no default: startup fails if this is unset.
    pub jwt_secret: Option<String>,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Interval for the expired-session sweep. Disabled when unset; read
    /// paths do not depend on it.
    pub session_sweep_interval_secs: Option<u64>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_ttl_minutes: default_access_token_ttl_minutes(),
            session_ttl_hours: default_session_ttl_hours(),
            session_sweep_interval_secs: None,
        }
    }
}

fn default_access_token_ttl_minutes() -> i64 {
    30
}

fn default_session_ttl_hours() -> i64 {
    12
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    /// Reject configurations the server must not start with.
    pub fn validate(&self) -> Result<()> {
        match self.auth.jwt_secret.as_deref() {
            None | Some("") => {
                bail!("auth.jwt_secret is not set; refusing to start without a signing secret")
            }
            Some(_) => {}
        }
        if self.auth.access_token_ttl_minutes < 0 {
            bail!("auth.access_token_ttl_minutes must not be negative");
        }
        if self.auth.session_ttl_hours <= 0 {
            bail!("auth.session_ttl_hours must be positive");
        }
        Ok(())
    }

    /// Connection string for the primary store.
    pub fn main_db_url(&self) -> String {
        self.database.main_url.clone().unwrap_or_else(|| {
            format!(
                "sqlite:{}?mode=rwc",
                self.server.data_dir.join("subtrackr.db").display()
            )
        })
    }

    /// Connection string for the session store.
    pub fn session_db_url(&self) -> String {
        self.database.session_url.clone().unwrap_or_else(|| {
            format!(
                "sqlite:{}?mode=rwc",
                self.server.data_dir.join("sessions.db").display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_require_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_config() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("test-signing-secret".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.access_token_ttl_minutes, 30);
        assert_eq!(config.auth.session_ttl_hours, 12);
        assert!(config.auth.session_sweep_interval_secs.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9090

            [auth]
            jwt_secret = "s3cret"
            session_ttl_hours = 6

            [database]
            session_url = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.session_ttl_hours, 6);
        assert_eq!(
            config.database.session_url.as_deref(),
            Some("sqlite::memory:")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_db_url_fallback() {
        let config = Config::default();
        assert!(config.main_db_url().contains("subtrackr.db"));
        assert!(config.session_db_url().contains("sessions.db"));
    }
}
