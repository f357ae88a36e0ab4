/// Redis-backed job status store
///
/// Each job is one string key, `waitlistr:export:{job_id}`, holding the JSON
/// form of [`JobStatus`] with an `EX` expiry. Terminal writes use `SET ... XX`
/// so they never resurrect an expired key.

use async_trait::async_trait;
use std::time::Duration;

use super::{JobId, JobStatus, JobStatusError, JobStatusStore};
use crate::redis::{RedisClient, RedisClientError};

const KEY_PREFIX: &str = "waitlistr:export:";

#[derive(Clone)]
pub struct RedisJobStatusStore {
    client: RedisClient,
    ttl: Duration,
}

impl RedisJobStatusStore {
    pub fn new(client: RedisClient, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    pub fn key(job_id: &JobId) -> String {
        format!("{}{}", KEY_PREFIX, job_id)
    }

    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }

    async fn run<T: redis::FromRedisValue>(&self, cmd: redis::Cmd) -> Result<T, JobStatusError> {
        let mut conn = self.client.connection();
        let timeout = self.client.config().command_timeout();

        let value = tokio::time::timeout(timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| RedisClientError::Timeout(timeout))?
            .map_err(RedisClientError::from)?;

        Ok(value)
    }

    fn encode(job_id: &JobId, status: &JobStatus) -> Result<String, JobStatusError> {
        serde_json::to_string(status).map_err(|e| JobStatusError::Corrupt {
            job_id: job_id.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl JobStatusStore for RedisJobStatusStore {
    async fn create(&self, job_id: &JobId) -> Result<(), JobStatusError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(Self::key(job_id))
            .arg(Self::encode(job_id, &JobStatus::Processing)?)
            .arg("EX")
            .arg(self.ttl_secs());

        self.run::<()>(cmd).await?;
        tracing::debug!(job_id = %job_id, ttl_secs = self.ttl_secs(), "Export job created");
        Ok(())
    }

    async fn finish(&self, job_id: &JobId, outcome: JobStatus) -> Result<bool, JobStatusError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(Self::key(job_id))
            .arg(Self::encode(job_id, &outcome)?)
            .arg("XX")
            .arg("EX")
            .arg(self.ttl_secs());

        // nil reply: key already gone
        let reply: Option<String> = self.run(cmd).await?;
        let written = reply.is_some();

        if !written {
            tracing::warn!(job_id = %job_id, "Export job finished after its status entry expired");
        }
        Ok(written)
    }

    async fn query(&self, job_id: &JobId) -> Result<Option<JobStatus>, JobStatusError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(Self::key(job_id));

        let raw: Option<String> = self.run(cmd).await?;

        raw.map(|value| {
            serde_json::from_str(&value).map_err(|e| JobStatusError::Corrupt {
                job_id: job_id.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::RedisConfig;

    #[test]
    fn test_key_layout() {
        let job_id = JobId::from("0123456789abcdef0123456789abcdef".to_string());
        assert_eq!(
            RedisJobStatusStore::key(&job_id),
            "waitlistr:export:0123456789abcdef0123456789abcdef"
        );
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_redis_lifecycle() {
        let client = RedisClient::connect(RedisConfig::default()).await.unwrap();
        let store = RedisJobStatusStore::new(client, Duration::from_secs(60));
        let job_id = JobId::generate();

        assert_eq!(store.query(&job_id).await.unwrap(), None);
        assert!(!store.complete(&job_id, "https://files/x").await.unwrap());
        assert_eq!(store.query(&job_id).await.unwrap(), None);

        store.create(&job_id).await.unwrap();
        assert_eq!(store.query(&job_id).await.unwrap(), Some(JobStatus::Processing));

        assert!(store.complete(&job_id, "https://files/x").await.unwrap());
        assert_eq!(
            store.query(&job_id).await.unwrap(),
            Some(JobStatus::Complete {
                url: "https://files/x".to_string()
            })
        );
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_redis_entry_expires() {
        let client = RedisClient::connect(RedisConfig::default()).await.unwrap();
        let store = RedisJobStatusStore::new(client, Duration::from_secs(1));
        let job_id = JobId::generate();

        store.create(&job_id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert_eq!(store.query(&job_id).await.unwrap(), None);
        assert!(!store.fail(&job_id, "too late").await.unwrap());
    }
}
