/// Redis connection wrapper
///
/// Wraps `redis::aio::ConnectionManager`, which reconnects on its own after a
/// dropped connection. The client is opened once at startup, cloned into
/// whatever needs it, and dropped at shutdown.
///
/// # Example
///
/// ```no_run
/// use waitlistr_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::connect(RedisConfig::from_env()?).await?;
/// assert!(client.ping().await?);
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedisClientError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command error: {0}")]
    CommandError(String),

    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    #[error("Redis command timed out after {0:?}")]
    Timeout(Duration),
}

impl From<RedisError> for RedisClientError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            RedisClientError::ConnectionError(err.to_string())
        } else {
            RedisClientError::CommandError(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// `redis://[user:password@]host:port[/db]`
    pub url: String,

    /// Budget for establishing the first connection
    pub connection_timeout_secs: u64,

    /// Budget for any single command
    pub command_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout_secs: 5,
            command_timeout_secs: 5,
        }
    }
}

impl RedisConfig {
    /// Reads `REDIS_URL`, `REDIS_CONNECTION_TIMEOUT_SECS` and
    /// `REDIS_COMMAND_TIMEOUT_SECS`
    ///
    /// # Errors
    ///
    /// `REDIS_URL` is required.
    pub fn from_env() -> Result<Self, RedisClientError> {
        dotenvy::dotenv().ok();

        let url = env::var("REDIS_URL").map_err(|_| {
            RedisClientError::ConfigError("REDIS_URL environment variable is required".to_string())
        })?;

        let defaults = Self::default();
        let secs = |name: &str, default: u64| {
            env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            url,
            connection_timeout_secs: secs(
                "REDIS_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            command_timeout_secs: secs("REDIS_COMMAND_TIMEOUT_SECS", defaults.command_timeout_secs),
        })
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Opens the connection manager and verifies it with a PING
    ///
    /// # Errors
    ///
    /// Fails on an invalid URL, an unreachable server, or a connect that
    /// exceeds `connection_timeout_secs`.
    pub async fn connect(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let connect_timeout = Duration::from_secs(config.connection_timeout_secs);
        let manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RedisClientError::Timeout(connect_timeout))?
            .map_err(|e| {
                RedisClientError::ConnectionError(format!("Failed to connect to Redis: {}", e))
            })?;

        let client = Self {
            manager,
            config: Arc::new(config),
        };
        client.ping().await?;

        tracing::info!(url = %sanitize_url(&client.config.url), "Redis connected");
        Ok(client)
    }

    /// Sends PING, bounded by the command timeout
    ///
    /// Returns `Ok(false)` if the server answers with anything but PONG.
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let mut conn = self.manager.clone();

        let pong: String = tokio::time::timeout(
            self.config.command_timeout(),
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| RedisClientError::Timeout(self.config.command_timeout()))??;

        if pong != "PONG" {
            tracing::warn!(response = %pong, "Unexpected PING response");
        }
        Ok(pong == "PONG")
    }

    /// A handle onto the shared connection
    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

/// Masks credentials in a Redis URL for logging
pub fn sanitize_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
