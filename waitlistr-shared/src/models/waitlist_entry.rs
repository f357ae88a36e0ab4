/// Waitlist entries
///
/// One row per (project, email). Rows with a NULL `project_id` make up the
/// legacy global waitlist fed by `/waitlist/v1/add`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE waitlist_entries (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT REFERENCES projects (id) ON DELETE CASCADE,
///     email VARCHAR(320) NOT NULL,
///     date_added TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX ... ON waitlist_entries (project_id, email);
/// CREATE UNIQUE INDEX ... ON waitlist_entries (email) WHERE project_id IS NULL;
/// ```
///
/// The unique indexes are what reject duplicates. [`WaitlistEntry::exists`]
/// only lets [`WaitlistEntry::add`] skip a doomed insert; two concurrent
/// submissions of the same email both pass it and one of them then fails on
/// the index, which is reported as [`WaitlistError::AlreadyListed`] too.
///
/// # Example
///
/// ```no_run
/// use waitlistr_shared::models::waitlist_entry::{WaitlistEntry, WaitlistError};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64) -> Result<(), WaitlistError> {
/// WaitlistEntry::add(&pool, Some(project_id), "a@x.com").await?;
///
/// match WaitlistEntry::add(&pool, Some(project_id), "a@x.com").await {
///     Err(WaitlistError::AlreadyListed) => {}
///     other => panic!("expected duplicate rejection, got {:?}", other),
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WaitlistEntry {
    pub id: i64,

    /// Owning project, `None` for the global list
    pub project_id: Option<i64>,

    pub email: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error("Email already in the waitlist")]
    AlreadyListed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

impl WaitlistEntry {
    /// Whether `email` is already on the list of `project_id`
    pub async fn exists(
        pool: &PgPool,
        project_id: Option<i64>,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM waitlist_entries
                WHERE project_id IS NOT DISTINCT FROM $1 AND email = $2
            )
            "#,
        )
        .bind(project_id)
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Adds `email` to the list of `project_id`, stamped with the current time
    ///
    /// # Errors
    ///
    /// `WaitlistError::AlreadyListed` if the pair already exists, whether
    /// caught by the pre-check or by the unique index.
    pub async fn add(
        pool: &PgPool,
        project_id: Option<i64>,
        email: &str,
    ) -> Result<Self, WaitlistError> {
        if Self::exists(pool, project_id, email).await? {
            return Err(WaitlistError::AlreadyListed);
        }

        sqlx::query_as::<_, WaitlistEntry>(
            r#"
            INSERT INTO waitlist_entries (project_id, email, date_added)
            VALUES ($1, $2, NOW())
            RETURNING id, project_id, email, date_added
            "#,
        )
        .bind(project_id)
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                debug!(?project_id, "Duplicate waitlist insert rejected by unique index");
                WaitlistError::AlreadyListed
            } else {
                WaitlistError::Database(e)
            }
        })
    }

    /// One page of a project's list, oldest first
    pub async fn list_page(
        pool: &PgPool,
        project_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaitlistEntry>(
            r#"
            SELECT id, project_id, email, date_added
            FROM waitlist_entries
            WHERE project_id = $1
            ORDER BY date_added ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Every entry of a project, oldest first
    ///
    /// Used to snapshot a list before handing it to an export job.
    pub async fn list_all(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaitlistEntry>(
            r#"
            SELECT id, project_id, email, date_added
            FROM waitlist_entries
            WHERE project_id = $1
            ORDER BY date_added ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool, project_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM waitlist_entries WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
