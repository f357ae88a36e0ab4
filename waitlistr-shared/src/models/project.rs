/// Projects
///
/// A project is one waitlist owned by one user. Clients address it through
/// `project_id`, an opaque UUIDv4 string minted on insert. The internal `id`
/// never leaves the service except inside API key listings.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     project_id VARCHAR(64) NOT NULL UNIQUE,
///     owner_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     url TEXT,
///     "limit" INTEGER NOT NULL DEFAULT 50,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Every lookup is scoped by `owner_id`: another owner's project reads as
/// missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Waitlist capacity given to every new project
pub const DEFAULT_PROJECT_LIMIT: i32 = 50;

const PROJECT_COLUMNS: &str = r#"id, project_id, owner_id, name, description, url, "limit", is_active, created_at, updated_at"#;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,

    /// Public identifier. Written once on insert.
    pub project_id: String,

    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub name: String,
    pub description: String,

    /// Site the waitlist is embedded on
    pub url: Option<String>,

    /// Waitlist capacity
    pub limit: i32,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`Project::create`]
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub url: Option<String>,
}

/// Input for [`Project::update`]
///
/// `project_id` is not updatable.
#[derive(Debug, Clone)]
pub struct UpdateProject {
    pub name: String,
    pub description: String,
    pub url: Option<String>,
}

/// Mints a fresh public project identifier
pub fn generate_public_id() -> String {
    Uuid::new_v4().to_string()
}

impl Project {
    /// Inserts a project with a new public id and the default limit
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (project_id, owner_id, name, description, url, "limit")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(generate_public_id())
        .bind(data.owner_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.url)
        .bind(DEFAULT_PROJECT_LIMIT)
        .fetch_one(pool)
        .await
    }

    /// Looks up a project by public id, restricted to `owner_id`
    pub async fn find_by_public_id(
        pool: &PgPool,
        project_id: &str,
        owner_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = $1 AND owner_id = $2"
        ))
        .bind(project_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    /// All projects of one owner, oldest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    /// Updates name, description and url
    ///
    /// Returns `None` when no project with that public id belongs to the
    /// owner.
    pub async fn update(
        pool: &PgPool,
        project_id: &str,
        owner_id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = $3, description = $4, url = $5, updated_at = NOW()
            WHERE project_id = $1 AND owner_id = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(project_id)
        .bind(owner_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.url)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project together with its API keys and waitlist entries
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
