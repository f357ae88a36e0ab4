/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `REDIS_URL`: Redis connection string (default: redis://127.0.0.1:6379)
/// - `REDIS_CONNECTION_TIMEOUT_SECS` / `REDIS_COMMAND_TIMEOUT_SECS` (default: 5)
/// - `S3_BUCKET`: Export bucket (required)
/// - `AWS_REGION`: Bucket region (default: us-east-1)
/// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: Static credentials (optional)
/// - `S3_ENDPOINT`: Custom S3-compatible endpoint (optional)
/// - `EXPORT_JOB_TTL_SECS`: Lifetime of a download status entry (default: 3600)
/// - `EXPORT_QUEUE_CAPACITY`: Pending exports before new ones are refused (default: 64)
///
/// # Example
///
/// ```no_run
/// use waitlistr_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use waitlistr_shared::{db::pool::PoolSettings, redis::RedisConfig};
use waitlistr_worker::{runner::ExportRunnerConfig, storage::S3Settings};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Redis configuration (export status cache)
    pub redis: RedisSection,

    /// Object storage for exports
    pub storage: StorageConfig,

    /// Export runner tuning
    pub export: ExportConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS header)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSection {
    pub url: String,
    pub connection_timeout_secs: u64,
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// TTL of a job status entry, also the presigned URL lifetime
    pub job_ttl_secs: u64,

    pub queue_capacity: usize,
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Splits a comma-separated origin list, dropping blanks
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = parse_or("API_PORT", 8080u16)?;
        let cors_origins =
            parse_cors_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));
        let production = parse_or("PRODUCTION", false)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let redis = RedisSection {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            connection_timeout_secs: parse_or("REDIS_CONNECTION_TIMEOUT_SECS", 5u64)?,
            command_timeout_secs: parse_or("REDIS_COMMAND_TIMEOUT_SECS", 5u64)?,
        };

        let bucket = optional("S3_BUCKET")
            .ok_or_else(|| anyhow::anyhow!("S3_BUCKET environment variable is required"))?;

        let storage = StorageConfig {
            bucket,
            region: optional("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            access_key_id: optional("AWS_ACCESS_KEY_ID"),
            secret_access_key: optional("AWS_SECRET_ACCESS_KEY"),
            endpoint: optional("S3_ENDPOINT"),
        };

        let export = ExportConfig {
            job_ttl_secs: parse_or("EXPORT_JOB_TTL_SECS", 3600u64)?,
            queue_capacity: parse_or("EXPORT_QUEUE_CAPACITY", 64usize)?,
        };

        if export.job_ttl_secs == 0 {
            anyhow::bail!("EXPORT_JOB_TTL_SECS must be greater than zero");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            redis,
            storage,
            export,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    pub fn redis_config(&self) -> RedisConfig {
        RedisConfig {
            url: self.redis.url.clone(),
            connection_timeout_secs: self.redis.connection_timeout_secs,
            command_timeout_secs: self.redis.command_timeout_secs,
        }
    }

    pub fn s3_settings(&self) -> S3Settings {
        S3Settings {
            bucket: self.storage.bucket.clone(),
            region: self.storage.region.clone(),
            access_key_id: self.storage.access_key_id.clone(),
            secret_access_key: self.storage.secret_access_key.clone(),
            endpoint: self.storage.endpoint.clone(),
        }
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.export.job_ttl_secs)
    }

    pub fn runner_config(&self) -> ExportRunnerConfig {
        ExportRunnerConfig {
            queue_capacity: self.export.queue_capacity,
            url_expiry: self.job_ttl(),
            ..Default::default()
        }
    }

    /// Configuration for tests and local tooling, pointing at `database_url`
    pub fn for_testing(database_url: &str) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url.to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            redis: RedisSection {
                url: "redis://127.0.0.1:6379".to_string(),
                connection_timeout_secs: 5,
                command_timeout_secs: 5,
            },
            storage: StorageConfig {
                bucket: "waitlistr-test".to_string(),
                region: "us-east-1".to_string(),
                access_key_id: None,
                secret_access_key: None,
                endpoint: None,
            },
            export: ExportConfig {
                job_ttl_secs: 3600,
                queue_capacity: 64,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_testing("postgresql://localhost/test");
        config.api.port = 8080;

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_cors_origins() {
        assert_eq!(parse_cors_origins("*"), vec!["*"]);
        assert_eq!(
            parse_cors_origins("https://a.com, https://b.com,,"),
            vec!["https://a.com", "https://b.com"]
        );
        assert!(parse_cors_origins("").is_empty());
    }

    #[test]
    fn test_derived_settings() {
        let mut config = Config::for_testing("postgresql://localhost/test");
        config.export.job_ttl_secs = 120;
        config.export.queue_capacity = 8;

        assert_eq!(config.pool_settings().max_connections, 5);
        assert_eq!(config.pool_settings().url, "postgresql://localhost/test");
        assert_eq!(config.redis_config().command_timeout_secs, 5);
        assert_eq!(config.s3_settings().bucket, "waitlistr-test");

        let runner = config.runner_config();
        assert_eq!(runner.queue_capacity, 8);
        assert_eq!(runner.url_expiry, Duration::from_secs(120));
    }

    #[test]
    fn test_secret_access_key_not_serialized() {
        let mut config = Config::for_testing("postgresql://localhost/test");
        config.storage.secret_access_key = Some("hunter2".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
