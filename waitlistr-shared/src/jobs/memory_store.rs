/// Process-local job status store
///
/// Expiry uses `tokio::time::Instant`, so tests running with a paused clock
/// can step past the TTL with `tokio::time::advance`. Expired entries are
/// dropped on access and swept on every `create`, so the map stays bounded
/// by the jobs started within one TTL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{JobId, JobStatus, JobStatusError, JobStatusStore};

#[derive(Debug)]
struct Entry {
    status: JobStatus,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct InMemoryJobStatusStore {
    ttl: Duration,
    entries: Mutex<HashMap<JobId, Entry>>,
}

impl InMemoryJobStatusStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of entries not yet expired
    pub async fn live_entries(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Live entries and their states, in no particular order
    pub async fn snapshot(&self) -> Vec<(JobId, JobStatus)> {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(job_id, entry)| (job_id.clone(), entry.status.clone()))
            .collect()
    }
}

impl Default for InMemoryJobStatusStore {
    fn default() -> Self {
        Self::new(super::DEFAULT_JOB_TTL)
    }
}

#[async_trait]
impl JobStatusStore for InMemoryJobStatusStore {
    async fn create(&self, job_id: &JobId) -> Result<(), JobStatusError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            job_id.clone(),
            Entry {
                status: JobStatus::Processing,
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn finish(&self, job_id: &JobId, outcome: JobStatus) -> Result<bool, JobStatusError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get_mut(job_id) {
            Some(entry) if entry.expires_at > now => {
                entry.status = outcome;
                entry.expires_at = now + self.ttl;
                Ok(true)
            }
            Some(_) => {
                entries.remove(job_id);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn query(&self, job_id: &JobId) -> Result<Option<JobStatus>, JobStatusError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get(job_id) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.status.clone())),
            Some(_) => {
                entries.remove(job_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
