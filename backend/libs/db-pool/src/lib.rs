//! Database connection pool management
//!
//! Provides PostgreSQL pool creation and configuration for CityScope services

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// Database connection pool configuration
#[derive(Clone)]
pub struct DbConfig {
    /// Service name for log labeling
    pub service_name: String,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection creation timeout (new connection to PostgreSQL)
    pub connect_timeout_secs: u64,
    /// Connection acquisition timeout (get connection from pool)
    pub acquire_timeout_secs: u64,
    /// Connection idle timeout
    pub idle_timeout_secs: u64,
    /// Connection maximum lifetime
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: String::from("unknown"),
            database_url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl DbConfig {
    /// Create a new DbConfig from environment variables
    pub fn from_env(service_name: &str) -> Result<Self, String> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Build a DbConfig from an arbitrary key lookup
    ///
    /// `DATABASE_URL` is required; pool sizing and timeouts fall back to
    /// [`DbConfig::default`] when absent or unparsable.
    pub fn from_lookup(
        service_name: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| "DATABASE_URL environment variable not set".to_string())?;
        let defaults = Self::default();

        let config = Self {
            service_name: service_name.to_string(),
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_secs: parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            acquire_timeout_secs: parse_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            ),
            idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_or(&lookup, "DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        };

        if config.min_connections > config.max_connections {
            return Err(format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                config.min_connections, config.max_connections
            ));
        }

        Ok(config)
    }

    /// Log pool configuration details
    pub fn log_config(&self) {
        info!(
            "Database Pool Configuration: \
             max_connections={}, min_connections={}, \
             connect_timeout={}s, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
            self.max_connections,
            self.min_connections,
            self.connect_timeout_secs,
            self.acquire_timeout_secs,
            self.idle_timeout_secs,
            self.max_lifetime_secs
        );
    }
}

/// Create a PostgreSQL connection pool and verify it answers queries
pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    debug!(
        "Creating database pool: service={}, max={}, min={}, acquire_timeout={}s",
        config.service_name,
        config.max_connections,
        config.min_connections,
        config.acquire_timeout_secs,
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            info!(
                service = %config.service_name,
                "Database pool created and verified successfully"
            );
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(
                service = %config.service_name,
                error = %e,
                "Database connection verification failed"
            );
            Err(e)
        }
        Err(_) => {
            error!(
                service = %config.service_name,
                timeout_secs = config.connect_timeout_secs,
                "Database connection verification timeout"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}
