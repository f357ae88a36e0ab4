/// Export runner
///
/// Executes export jobs outside the request/response cycle and records every
/// outcome in the job status cache.
///
/// # Architecture
///
/// ```text
/// ExportQueue::start_export
///   ├─> JobStatusStore: create "processing"
///   └─> mpsc queue
///         └─> dispatch loop (one per runner)
///               └─> tokio task per job
///                     ├─> ExportFormat: render rows
///                     ├─> ArtifactStore: put + presign
///                     └─> JobStatusStore: complete / fail
/// ```
///
/// # Shutdown
///
/// [`ExportRunner::shutdown`] cancels the dispatch loop. Jobs still queued
/// are marked failed; running jobs get `shutdown_grace` to finish and are
/// aborted after that.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use waitlistr_shared::jobs::memory_store::InMemoryJobStatusStore;
/// use waitlistr_worker::runner::{ExportRunner, ExportRunnerConfig};
/// use waitlistr_worker::storage::InMemoryArtifactStore;
///
/// # async fn example() {
/// let runner = ExportRunner::start(
///     Arc::new(InMemoryJobStatusStore::default()),
///     Arc::new(InMemoryArtifactStore::new()),
///     ExportRunnerConfig::default(),
/// );
/// let queue = runner.queue();
/// // hand `queue` to request handlers ...
/// runner.shutdown().await;
/// # }
/// ```

use bytes::Bytes;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use waitlistr_shared::jobs::{JobId, JobStatusError, JobStatusStore, DEFAULT_JOB_TTL};

use crate::format::{ExportFormat, ExportRow, FormatError};
use crate::storage::{ArtifactStore, StorageError};

/// Runner configuration
#[derive(Debug, Clone)]
pub struct ExportRunnerConfig {
    /// Jobs waiting for dispatch before `start_export` is refused
    pub queue_capacity: usize,

    /// Lifetime of the presigned download URL
    pub url_expiry: Duration,

    /// How long shutdown waits for running jobs
    pub shutdown_grace: Duration,
}

impl Default for ExportRunnerConfig {
    fn default() -> Self {
        ExportRunnerConfig {
            queue_capacity: 64,
            url_expiry: DEFAULT_JOB_TTL,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

/// Failure inside a single export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure to accept an export
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Export queue is full")]
    QueueFull,

    #[error("Export runner is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Status(#[from] JobStatusError),
}

/// One export request, with its entries already loaded
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub job_id: JobId,
    pub owner_id: i64,
    pub project_public_id: String,
    pub format: ExportFormat,
    pub rows: Vec<ExportRow>,
}

impl ExportJob {
    /// `{owner_id}/{project_public_id}/{job_id}.{ext}`
    pub fn artifact_path(&self) -> String {
        format!(
            "{}/{}/{}.{}",
            self.owner_id,
            self.project_public_id,
            self.job_id,
            self.format.extension()
        )
    }
}

/// Submission handle, cheap to clone into request state
#[derive(Clone)]
pub struct ExportQueue {
    tx: mpsc::Sender<ExportJob>,
    statuses: Arc<dyn JobStatusStore>,
}

impl ExportQueue {
    /// Registers a new job as processing and queues it
    ///
    /// Returns as soon as the job is queued; the export itself runs later.
    ///
    /// # Errors
    ///
    /// - `RunnerError::Status` if the cache entry could not be created
    /// - `RunnerError::QueueFull` / `RunnerError::ShuttingDown` if the job
    ///   was not accepted; its cache entry is then marked failed
    pub async fn start_export(
        &self,
        owner_id: i64,
        project_public_id: &str,
        format: ExportFormat,
        rows: Vec<ExportRow>,
    ) -> Result<JobId, RunnerError> {
        let job_id = JobId::generate();
        self.statuses.create(&job_id).await?;

        let job = ExportJob {
            job_id: job_id.clone(),
            owner_id,
            project_public_id: project_public_id.to_string(),
            format,
            rows,
        };

        let rejected = match self.tx.try_send(job) {
            Ok(()) => None,
            Err(mpsc::error::TrySendError::Full(_)) => Some(RunnerError::QueueFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Some(RunnerError::ShuttingDown),
        };

        if let Some(err) = rejected {
            tracing::warn!(job_id = %job_id, error = %err, "Export rejected");
            if let Err(e) = self.statuses.fail(&job_id, &err.to_string()).await {
                tracing::error!(job_id = %job_id, error = %e, "Failed to record rejected export");
            }
            return Err(err);
        }

        tracing::info!(
            job_id = %job_id,
            owner_id,
            project_id = %project_public_id,
            format = %format,
            "Export queued"
        );
        Ok(job_id)
    }
}

/// Owns the dispatch loop
pub struct ExportRunner {
    queue: ExportQueue,
    shutdown_token: CancellationToken,
    dispatch: JoinHandle<()>,
}

impl ExportRunner {
    /// Spawns the dispatch loop on the current runtime
    pub fn start(
        statuses: Arc<dyn JobStatusStore>,
        artifacts: Arc<dyn ArtifactStore>,
        config: ExportRunnerConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let shutdown_token = CancellationToken::new();

        let dispatcher = Dispatcher {
            statuses: statuses.clone(),
            artifacts,
            config,
        };
        let dispatch = tokio::spawn(dispatcher.run(rx, shutdown_token.clone()));

        tracing::info!("Export runner started");

        ExportRunner {
            queue: ExportQueue { tx, statuses },
            shutdown_token,
            dispatch,
        }
    }

    pub fn queue(&self) -> ExportQueue {
        self.queue.clone()
    }

    /// Used to signal shutdown from external handlers
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Stops the runner and waits for the dispatch loop to drain
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        if let Err(e) = self.dispatch.await {
            tracing::error!(error = %e, "Export dispatch loop ended abnormally");
        }
        tracing::info!("Export runner shut down");
    }
}

struct Dispatcher {
    statuses: Arc<dyn JobStatusStore>,
    artifacts: Arc<dyn ArtifactStore>,
    config: ExportRunnerConfig,
}

impl Dispatcher {
    async fn run(self, mut rx: mpsc::Receiver<ExportJob>, shutdown: CancellationToken) {
        let mut running = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                job = rx.recv() => match job {
                    Some(job) => {
                        running.spawn(execute_job(
                            job,
                            self.statuses.clone(),
                            self.artifacts.clone(),
                            self.config.url_expiry,
                        ));
                    }
                    None => break,
                },
                // reap finished jobs so the set stays small
                Some(_) = running.join_next(), if !running.is_empty() => {}
            }
        }

        rx.close();
        while let Some(job) = rx.recv().await {
            tracing::warn!(job_id = %job.job_id, "Dropping queued export at shutdown");
            record_failure(self.statuses.as_ref(), &job.job_id, "Export service shutting down").await;
        }

        if running.is_empty() {
            return;
        }

        tracing::info!(
            count = running.len(),
            "Shutdown requested, waiting for running exports to complete"
        );

        let drained = tokio::time::timeout(self.config.shutdown_grace, async {
            while running.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(count = running.len(), "Force shutdown with exports still running");
            running.shutdown().await;
        }
    }
}

/// Runs one export and records its outcome, panics included
async fn execute_job(
    job: ExportJob,
    statuses: Arc<dyn JobStatusStore>,
    artifacts: Arc<dyn ArtifactStore>,
    url_expiry: Duration,
) {
    let job_id = job.job_id.clone();

    tracing::info!(job_id = %job_id, rows = job.rows.len(), "Executing export");

    let outcome = AssertUnwindSafe(produce_artifact(&job, artifacts.as_ref(), url_expiry))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(url)) => match statuses.complete(&job_id, &url).await {
            Ok(true) => tracing::info!(job_id = %job_id, "Export complete"),
            Ok(false) => {}
            Err(e) => tracing::error!(job_id = %job_id, error = %e, "Failed to record export URL"),
        },
        Ok(Err(e)) => {
            tracing::error!(job_id = %job_id, error = %e, "Export failed");
            record_failure(statuses.as_ref(), &job_id, &e.to_string()).await;
        }
        Err(_) => {
            tracing::error!(job_id = %job_id, "Export panicked");
            record_failure(statuses.as_ref(), &job_id, "Export job panicked").await;
        }
    }
}

async fn produce_artifact(
    job: &ExportJob,
    artifacts: &dyn ArtifactStore,
    url_expiry: Duration,
) -> Result<String, ExportError> {
    let body = job.format.render(&job.rows)?;
    let path = job.artifact_path();

    artifacts
        .put(&path, Bytes::from(body), job.format.content_type())
        .await?;

    Ok(artifacts.presign(&path, url_expiry).await?)
}

async fn record_failure(statuses: &dyn JobStatusStore, job_id: &JobId, reason: &str) {
    if let Err(e) = statuses.fail(job_id, reason).await {
        tracing::error!(job_id = %job_id, error = %e, "Failed to record export failure");
    }
}
