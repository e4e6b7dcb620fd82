//! Database connection settings resolved from the environment.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// Bound on initial connection establishment.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection parameters for the attendance database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Absent means the server's own auth rules apply
    pub password: Option<String>,
}

impl DbConfig {
    /// Read settings from the `DB_*` environment variables, falling back to
    /// the documented defaults. Only `DB_PASSWORD` has no default.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("DB_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid DB_PORT value: {}", raw))?,
            Err(_) => 5432,
        };

        Ok(Self {
            host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port,
            database: env::var("DB_NAME").unwrap_or_else(|_| "robotics_attendance".to_string()),
            user: env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: env::var("DB_PASSWORD").ok(),
        })
    }

    /// Open a single-connection pool against the configured database.
    ///
    /// The whole import runs on one transactional session, so the pool is
    /// capped at one connection and the timeout bounds establishment.
    pub async fn connect(&self) -> Result<PgPool> {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user);
        if let Some(password) = &self.password {
            options = options.password(password);
        }

        log::debug!(
            "Connecting to {}:{}/{} as {}",
            self.host,
            self.port,
            self.database,
            self.user
        );

        PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to database '{}' at {}:{}",
                    self.database, self.host, self.port
                )
            })
    }
}
