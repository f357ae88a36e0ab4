/// Project API keys
///
/// A key authorizes waitlist submissions to exactly one project. Only the
/// SHA-256 digest and an 8-character prefix are stored; the plaintext is
/// returned from [`ApiKey::create`] and nowhere else.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE api_keys (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects (id) ON DELETE CASCADE,
///     key_prefix VARCHAR(16) NOT NULL,
///     key_hash CHAR(64) NOT NULL UNIQUE,
///     alias VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_used_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use waitlistr_shared::models::api_key::ApiKey;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64) -> Result<(), sqlx::Error> {
/// let (key, plaintext) = ApiKey::create(&pool, project_id, Some("landing page".to_string())).await?;
///
/// let resolved = ApiKey::resolve(&pool, &plaintext).await?;
/// assert_eq!(resolved.map(|k| k.id), Some(key.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::api_key::{generate_api_key, hash_api_key, validate_api_key_format};

const API_KEY_COLUMNS: &str = "id, project_id, key_prefix, key_hash, alias, created_at, last_used_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKey {
    pub id: i64,

    /// Internal id of the owning project
    pub project_id: i64,

    /// First characters of the plaintext, for display
    pub key_prefix: String,

    /// SHA-256 hex digest of the plaintext
    #[serde(skip_serializing)]
    pub key_hash: String,

    pub alias: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Last successful waitlist submission with this key
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Generates and stores a new key for `project_id`
    ///
    /// Returns the record and the plaintext key.
    pub async fn create(
        pool: &PgPool,
        project_id: i64,
        alias: Option<String>,
    ) -> Result<(Self, String), sqlx::Error> {
        let generated = generate_api_key();

        let api_key = sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            INSERT INTO api_keys (project_id, key_prefix, key_hash, alias)
            VALUES ($1, $2, $3, $4)
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(project_id)
        .bind(&generated.display_prefix)
        .bind(&generated.hash)
        .bind(alias)
        .fetch_one(pool)
        .await?;

        Ok((api_key, generated.plaintext))
    }

    /// Resolves a plaintext key to its record and stamps `last_used_at`
    ///
    /// Malformed keys short-circuit to `None` without touching the database.
    pub async fn resolve(pool: &PgPool, plaintext: &str) -> Result<Option<Self>, sqlx::Error> {
        if !validate_api_key_format(plaintext) {
            return Ok(None);
        }

        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            UPDATE api_keys
            SET last_used_at = NOW()
            WHERE key_hash = $1
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(hash_api_key(plaintext))
        .fetch_optional(pool)
        .await
    }

    /// Keys of one project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE project_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Sets the alias of key `id` within `project_id`
    ///
    /// Returns `None` when the key does not belong to the project.
    pub async fn update_alias(
        pool: &PgPool,
        id: i64,
        project_id: i64,
        alias: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            UPDATE api_keys
            SET alias = $3
            WHERE id = $1 AND project_id = $2
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(project_id)
        .bind(alias)
        .fetch_optional(pool)
        .await
    }

    /// Deletes key `id` within `project_id`; false when no such key
    pub async fn delete(pool: &PgPool, id: i64, project_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
