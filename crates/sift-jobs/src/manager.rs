//! Job lifecycle management.
//!
//! [`JobsManager`] tracks every asynchronous job an engine starts: it writes
//! through to the durable [`JobStore`] (authoritative for status and
//! listing, survives restarts) and mirrors live jobs in the
//! [`LiveJobRegistry`] (holds the in-process cancel handles, dies with the
//! process). The two layers are reconciled best-effort; losing a
//! bookkeeping write must never stall an engine's training or query path,
//! so plain status writes are spawned fire-and-forget and their failures
//! logged.
//!
//! ## Lifecycle
//!
//! ```text
//! queued → executing → successful | failed | cancelled
//!      ↘ failed | cancelled            (never started)
//! ```
//!
//! `expired` is reported, never stored: a non-terminal record past its TTL
//! shows up as expired in listings while the stored status stays put until
//! a terminal write lands.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use sift_commons::{EngineId, JobDescription, JobId, JobRecord, JobStatus, JobsSettings};

use crate::cancellable::Cancellable;
use crate::canceller::ExecutionCanceller;
use crate::error::Result;
use crate::registry::LiveJobRegistry;
use crate::store::{JobFilter, JobStore};

/// Terminal/expired records kept per engine in active-job listings. Bounds
/// the response while still surfacing recent history.
const TERMINAL_HISTORY_LIMIT: usize = 10;

/// Central coordinator for job creation, tracking, cancellation, and
/// crash recovery.
pub struct JobsManager {
    store: Arc<dyn JobStore>,
    registry: Arc<LiveJobRegistry>,
    canceller: Arc<dyn ExecutionCanceller>,
    expire_after_ms: i64,
}

impl JobsManager {
    /// Create a new JobsManager.
    ///
    /// # Arguments
    /// * `store` - durable job persistence
    /// * `canceller` - remote execution backend cancellation
    /// * `settings` - job settings, read once at process start
    pub fn new(
        store: Arc<dyn JobStore>,
        canceller: Arc<dyn ExecutionCanceller>,
        settings: &JobsSettings,
    ) -> Self {
        Self {
            store,
            registry: Arc::new(LiveJobRegistry::new()),
            canceller,
            expire_after_ms: settings.expire_after_ms(),
        }
    }

    /// Starts tracking a new job and returns its description.
    ///
    /// The record is persisted asynchronously; a failed insert is logged and
    /// not surfaced, and the in-memory registration still succeeds so the
    /// job stays cancellable for the remainder of this process's lifetime.
    pub fn add_job(
        &self,
        engine_id: EngineId,
        cancellable: Cancellable,
        comment: impl Into<String>,
        init_status: JobStatus,
    ) -> JobDescription {
        let now = chrono::Utc::now().timestamp_millis();
        let job_id = JobId::new(uuid::Uuid::new_v4().to_string());

        let record = JobRecord {
            created_at: now,
            completed_at: None,
            expire_at: now + self.expire_after_ms,
            engine_id: engine_id.clone(),
            job_id: job_id.clone(),
            comment: comment.into(),
            status: init_status,
        };
        let description = record.description(now);

        self.registry
            .put(engine_id.clone(), cancellable, description.clone());
        debug!(
            "[{}] job added for engine {} (status {})",
            job_id, engine_id, init_status
        );

        let store = self.store.clone();
        tokio::spawn(async move {
            let job_id = record.job_id.clone();
            if let Err(e) = store.insert_job(record).await {
                error!(
                    "[{}] failed to persist new job for engine {}: {}",
                    job_id, engine_id, e
                );
            }
        });

        description
    }

    /// Moves a job to `status` and swaps in a new cancel handle.
    ///
    /// The handle may differ build-to-build: a retried training run supplies
    /// a fresh cancel function for the same logical job. The durable write
    /// is fire-and-forget.
    pub fn update_job(
        &self,
        engine_id: &EngineId,
        job_id: &JobId,
        status: JobStatus,
        cancellable: Cancellable,
    ) {
        let store = self.store.clone();
        {
            let job_id = job_id.clone();
            tokio::spawn(async move {
                if let Err(e) = store.update_job_status(&job_id, status).await {
                    warn!(
                        "[{}] failed to persist status update to {}: {}",
                        job_id, status, e
                    );
                }
            });
        }

        if let Some(live) = self.registry.find(engine_id, job_id) {
            let description = JobDescription {
                status,
                ..live.description
            };
            self.registry
                .replace(engine_id, job_id, cancellable, description);
        }
    }

    /// Jobs to report for `engine_id`: every non-terminal record plus up to
    /// ten of the most recent terminal or expired ones, non-terminal
    /// statuses first.
    ///
    /// The expiration overlay is applied here at read time; stored statuses
    /// are never rewritten by a read.
    pub async fn get_active_job_descriptions(
        &self,
        engine_id: &EngineId,
    ) -> Result<Vec<JobDescription>> {
        let records = self.store.list_jobs_for_engine(engine_id).await?;
        let now = chrono::Utc::now().timestamp_millis();

        let mut descriptions = Vec::new();
        let mut terminal_kept = 0;
        // Records arrive newest first, so the first ten terminal ones seen
        // are the ten most recent.
        for record in &records {
            if !record.effective_status(now).is_terminal() {
                descriptions.push(record.description(now));
            } else if terminal_kept < TERMINAL_HISTORY_LIMIT {
                descriptions.push(record.description(now));
                terminal_kept += 1;
            }
        }

        // Stable sort: newest-first order survives within each status.
        descriptions.sort_by_key(|d| d.status.ordinal());
        Ok(descriptions)
    }

    /// JSON-serializable mapping from engine id to its reported jobs.
    pub async fn status_report(
        &self,
        engine_ids: &[EngineId],
    ) -> Result<BTreeMap<EngineId, Vec<JobDescription>>> {
        let mut report = BTreeMap::new();
        for engine_id in engine_ids {
            let descriptions = self.get_active_job_descriptions(engine_id).await?;
            report.insert(engine_id.clone(), descriptions);
        }
        Ok(report)
    }

    /// Marks the job successful with `completed_at` set, then drops its live
    /// registry entry. A job already terminal (for example cancelled in a
    /// concurrent request) is left as is.
    pub fn finish_job(&self, job_id: &JobId) {
        self.settle_job(job_id, JobStatus::Successful);
    }

    /// Marks the job failed. Symmetric to [`JobsManager::finish_job`].
    pub fn mark_job_failed(&self, job_id: &JobId) {
        self.settle_job(job_id, JobStatus::Failed);
    }

    fn settle_job(&self, job_id: &JobId, status: JobStatus) {
        let store = self.store.clone();
        let registry = self.registry.clone();
        let job_id = job_id.clone();
        tokio::spawn(async move {
            match store.update_job_status(&job_id, status).await {
                Ok(()) => {
                    registry.remove_globally(&job_id);
                    info!("[{}] job settled as {}", job_id, status);
                }
                Err(e) => warn!("[{}] failed to record job as {}: {}", job_id, status, e),
            }
        });
    }

    /// Best-effort, idempotent cancellation of one job.
    ///
    /// With no live entry this is a completed no-op: cancelling an unknown
    /// or already-finished job is expected and harmless. Otherwise the local
    /// handle is cancelled, then the execution backend is told (the local
    /// cancel only stops in-process work), then the durable record is moved
    /// to cancelled. Failures at each step are logged and the chain
    /// continues.
    pub async fn cancel_job(&self, engine_id: &EngineId, job_id: &JobId) {
        let Some(live) = self.registry.find(engine_id, job_id) else {
            debug!(
                "[{}] no live entry for engine {}, treating cancel as settled",
                job_id, engine_id
            );
            return;
        };

        if let Err(e) = live.cancellable.cancel().await {
            warn!("[{}] local cancellation failed: {}", job_id, e);
        }

        if let Err(e) = self.canceller.cancel(job_id).await {
            warn!("[{}] execution backend cancellation failed: {}", job_id, e);
        }

        match self.store.update_job_status(job_id, JobStatus::Cancelled).await {
            Ok(()) => info!("[{}] job cancelled", job_id),
            Err(e) => error!("[{}] failed to record cancellation: {}", job_id, e),
        }

        self.registry.remove_globally(job_id);
    }

    /// Cancels every live job of an engine and deletes all its records.
    /// Individual cancel failures are logged and do not abort the batch.
    pub async fn remove_all_jobs(&self, engine_id: &EngineId) {
        let live = self.registry.remove_all(engine_id);
        for job in live {
            if let Err(e) = job.cancellable.cancel().await {
                warn!(
                    "[{}] cancellation failed during engine teardown: {}",
                    job.description.job_id, e
                );
            }
        }

        match self
            .store
            .delete_jobs_matching(JobFilter::for_engine(engine_id.clone()))
            .await
        {
            Ok(removed) => info!("removed {} jobs for engine {}", removed, engine_id),
            Err(e) => error!("failed to remove jobs for engine {}: {}", engine_id, e),
        }
    }

    /// Deletes one record and its registry entry without checking status;
    /// callers must ensure the job is already terminal.
    #[deprecated(note = "listings already bound terminal history; rely on status-based retention")]
    pub async fn remove_job(&self, job_id: &JobId) {
        if let Err(e) = self.store.delete_job(job_id).await {
            warn!("[{}] failed to delete job record: {}", job_id, e);
        }
        self.registry.remove_globally(job_id);
    }

    /// Startup recovery: marks every record that is not terminal as failed
    /// with `completed_at` set.
    ///
    /// Accounts for jobs that were mid-flight when the previous process
    /// stopped and whose cancellation handles no longer exist. Returns the
    /// number of records recovered.
    pub async fn abort_executing_jobs(&self) -> Result<usize> {
        let aborted = self
            .store
            .update_jobs_matching(JobFilter::unfinished(), JobStatus::Failed)
            .await?;

        if aborted == 0 {
            info!("no unfinished jobs to recover");
        } else {
            warn!(
                "marked {} unfinished jobs from a previous run as failed",
                aborted
            );
        }
        Ok(aborted)
    }
}
