/// Export job status cache
///
/// Every waitlist export gets a job id and one cache entry with a fixed TTL.
/// The entry moves through a small state machine:
///
/// ```text
///            create                finish (export job only)
///   (none) ─────────▶ processing ─────────────────────────▶ complete{url}
///                         │       └───────────────────────▶ failed{reason}
///                         │ TTL                                  │ TTL
///                         ▼                                      ▼
///                     (expired) ◀────────────────────────────────┘
/// ```
///
/// `finish` only writes while the entry still exists. An export that
/// outlives its TTL therefore leaves nothing behind, and a later poll sees
/// "unknown job" rather than a stale "processing".
///
/// Two stores implement [`JobStatusStore`]:
///
/// - [`RedisJobStatusStore`]: the production store
/// - [`InMemoryJobStatusStore`]: process-local, used by tests and local runs
///
/// # Example
///
/// ```
/// use waitlistr_shared::jobs::{InMemoryJobStatusStore, JobId, JobStatus, JobStatusStore};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), waitlistr_shared::jobs::JobStatusError> {
/// let store = InMemoryJobStatusStore::new(Duration::from_secs(3600));
/// let job_id = JobId::generate();
///
/// store.create(&job_id).await?;
/// assert_eq!(store.query(&job_id).await?, Some(JobStatus::Processing));
///
/// store.complete(&job_id, "https://files.example.com/export.csv").await?;
/// assert!(matches!(store.query(&job_id).await?, Some(JobStatus::Complete { .. })));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::InMemoryJobStatusStore;
pub use redis_store::RedisJobStatusStore;

/// Lifetime of a job entry unless configured otherwise
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(3600);

/// Unguessable export job identifier
///
/// Generated ids are 32 lowercase hex characters (a v4 UUID without
/// hyphens). Ids arriving from clients are taken as-is; an id that was never
/// issued simply has no entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of a live job entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Complete { url: String },
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobStatusError {
    /// Backend unreachable or timed out
    #[error("Job status store unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded
    #[error("Corrupt job status entry for {job_id}: {message}")]
    Corrupt { job_id: String, message: String },
}

impl From<crate::redis::RedisClientError> for JobStatusError {
    fn from(err: crate::redis::RedisClientError) -> Self {
        JobStatusError::Unavailable(err.to_string())
    }
}

/// Time-bounded key-value store of export job states
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    /// Sets the job to `processing` with a fresh TTL
    async fn create(&self, job_id: &JobId) -> Result<(), JobStatusError>;

    /// Overwrites a live entry with a terminal state and refreshes its TTL
    ///
    /// Returns `false`, without writing, when the entry has already expired.
    async fn finish(&self, job_id: &JobId, outcome: JobStatus) -> Result<bool, JobStatusError>;

    /// Current state, or `None` for unknown and expired jobs
    async fn query(&self, job_id: &JobId) -> Result<Option<JobStatus>, JobStatusError>;

    /// Records the artifact URL of a finished export
    async fn complete(&self, job_id: &JobId, artifact_url: &str) -> Result<bool, JobStatusError> {
        self.finish(
            job_id,
            JobStatus::Complete {
                url: artifact_url.to_string(),
            },
        )
        .await
    }

    /// Records why an export did not produce an artifact
    async fn fail(&self, job_id: &JobId, reason: &str) -> Result<bool, JobStatusError> {
        self.finish(
            job_id,
            JobStatus::Failed {
                reason: reason.to_string(),
            },
        )
        .await
    }
}
