use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgConnectOptions;

/// Store credentials and pool sizing, supplied at process start.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: Secret<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_name: "lightbnb".to_string(),
            db_user: "vagrant".to_string(),
            db_password: Secret::new("vagrant".to_string()),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load from the environment, reading `.env` first when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing or unparseable values fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            db_host: lookup("PGHOST").unwrap_or(defaults.db_host),
            db_port: lookup("PGPORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.db_port),
            db_name: lookup("PGDATABASE").unwrap_or(defaults.db_name),
            db_user: lookup("PGUSER").unwrap_or(defaults.db_user),
            db_password: lookup("PGPASSWORD")
                .map(Secret::new)
                .unwrap_or(defaults.db_password),
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            acquire_timeout_secs: lookup("DB_ACQUIRE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.acquire_timeout_secs),
        };

        tracing::info!(
            "Config loaded - {}@{}:{}/{}, pool size {}",
            config.db_user,
            config.db_host,
            config.db_port,
            config.db_name,
            config.max_connections
        );

        config
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(self.db_password.expose_secret())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}
