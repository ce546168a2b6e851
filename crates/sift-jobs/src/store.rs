//! Durable job record storage.
//!
//! [`JobStore`] is the contract the job manager requires from persistence;
//! [`JobsStore`] implements it over a [`StorageBackend`] through the typed
//! [`EntityStore`]. Records are stored in the `jobs` partition keyed by job
//! id and persisted as JSON.
//!
//! All trait methods are async and never block the runtime: the synchronous
//! storage engine runs inside `spawn_blocking`.

use async_trait::async_trait;
use log::{debug, warn};
use sift_commons::{EngineId, JobId, JobRecord, JobStatus};
use sift_store::{EntityStore, Partition, StorageBackend};
use std::sync::Arc;

use crate::error::{JobError, Result};

/// Partition holding all job records.
///
/// RocksDB deployments must pass this to `sift_store::open_db` so the
/// column family exists before the store is used.
pub const JOBS_PARTITION: &str = "jobs";

/// Filter for bulk job operations.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Only records owned by this engine
    pub engine_id: Option<EngineId>,
    /// Only records whose stored status is one of these
    pub statuses: Option<Vec<JobStatus>>,
    /// Only records whose stored status is none of these
    pub exclude_statuses: Option<Vec<JobStatus>>,
}

impl JobFilter {
    /// Filter matching every record owned by `engine_id`.
    pub fn for_engine(engine_id: EngineId) -> Self {
        Self {
            engine_id: Some(engine_id),
            ..Self::default()
        }
    }

    /// Filter matching every record whose stored status is not terminal.
    pub fn unfinished() -> Self {
        Self {
            exclude_statuses: Some(vec![
                JobStatus::Successful,
                JobStatus::Failed,
                JobStatus::Cancelled,
            ]),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &JobRecord) -> bool {
        if let Some(engine_id) = &self.engine_id {
            if &record.engine_id != engine_id {
                return false;
            }
        }

        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&record.status) {
                return false;
            }
        }

        if let Some(excluded) = &self.exclude_statuses {
            if excluded.contains(&record.status) {
                return false;
            }
        }

        true
    }
}

/// Contract the job manager requires from durable job persistence.
///
/// Semantics every implementation must honor:
/// - `list_jobs_for_engine` returns records ordered by `created_at`
///   descending.
/// - `update_job_status` leaves a record that is already terminal untouched
///   and reports success; concurrent finish/cancel races resolve to
///   whichever terminal write landed first.
/// - [`JobStatus::Expired`] is a read-time overlay and is rejected as a
///   stored value with `InvalidOperation`.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persists a new record.
    async fn insert_job(&self, record: JobRecord) -> Result<()>;

    /// Looks up a single record by job id.
    ///
    /// A record whose bytes cannot be decoded (for example an unknown
    /// status tag) fails with [`JobError::Decode`].
    async fn get_job(&self, job_id: &JobId) -> Result<Option<JobRecord>>;

    /// All records owned by `engine_id`, newest first.
    async fn list_jobs_for_engine(&self, engine_id: &EngineId) -> Result<Vec<JobRecord>>;

    /// Moves the record to `status`, stamping `completed_at` on the first
    /// transition to a terminal status.
    async fn update_job_status(&self, job_id: &JobId, status: JobStatus) -> Result<()>;

    /// Moves every non-terminal record matching `filter` to `status`.
    /// Returns the number of records updated.
    async fn update_jobs_matching(&self, filter: JobFilter, status: JobStatus) -> Result<usize>;

    /// Deletes a record. Idempotent.
    async fn delete_job(&self, job_id: &JobId) -> Result<()>;

    /// Deletes every record matching `filter`. Returns the number removed.
    async fn delete_jobs_matching(&self, filter: JobFilter) -> Result<usize>;
}

/// [`JobStore`] implementation over a pluggable [`StorageBackend`].
#[derive(Clone)]
pub struct JobsStore {
    backend: Arc<dyn StorageBackend>,
}

impl EntityStore<JobId, JobRecord> for JobsStore {
    fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    fn partition(&self) -> &str {
        JOBS_PARTITION
    }
}

impl JobsStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn insert_job_sync(&self, record: &JobRecord) -> Result<()> {
        Ok(self.put(&record.job_id, record)?)
    }

    fn get_job_sync(&self, job_id: &JobId) -> Result<Option<JobRecord>> {
        Ok(self.get(job_id)?)
    }

    fn delete_job_sync(&self, job_id: &JobId) -> Result<()> {
        Ok(self.delete(job_id)?)
    }

    /// Scans every record in the partition. A record that fails to decode is
    /// logged and skipped so one malformed row cannot poison a whole query.
    fn scan_records_sync(&self) -> Result<Vec<JobRecord>> {
        let partition = Partition::new(self.partition());
        let entries = self
            .backend
            .scan(&partition, None, None)
            .map_err(JobError::from)?;

        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match self.deserialize(&value) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "skipping undecodable job record {}: {}",
                    String::from_utf8_lossy(&key),
                    e
                ),
            }
        }
        Ok(records)
    }

    fn list_jobs_for_engine_sync(&self, engine_id: &EngineId) -> Result<Vec<JobRecord>> {
        let mut records: Vec<JobRecord> = self
            .scan_records_sync()?
            .into_iter()
            .filter(|record| &record.engine_id == engine_id)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn apply_status(record: JobRecord, status: JobStatus) -> JobRecord {
        match status {
            JobStatus::Successful => record.finish(),
            JobStatus::Failed => record.fail(),
            JobStatus::Cancelled => record.cancel(),
            other => JobRecord {
                status: other,
                ..record
            },
        }
    }

    fn reject_expired(status: JobStatus) -> Result<()> {
        if status == JobStatus::Expired {
            return Err(JobError::InvalidOperation(
                "expired is derived at read time and never stored".to_string(),
            ));
        }
        Ok(())
    }

    fn update_job_status_sync(&self, job_id: &JobId, status: JobStatus) -> Result<()> {
        Self::reject_expired(status)?;

        let record = self
            .get_job_sync(job_id)?
            .ok_or_else(|| JobError::NotFound(format!("Job {} not found", job_id)))?;

        if record.status.is_terminal() {
            debug!(
                "[{}] already {}, leaving the record as is",
                job_id, record.status
            );
            return Ok(());
        }

        let updated = Self::apply_status(record, status);
        Ok(self.put(job_id, &updated)?)
    }

    fn update_jobs_matching_sync(&self, filter: &JobFilter, status: JobStatus) -> Result<usize> {
        Self::reject_expired(status)?;

        let updated: Vec<(JobId, JobRecord)> = self
            .scan_records_sync()?
            .into_iter()
            .filter(|record| filter.matches(record) && !record.status.is_terminal())
            .map(|record| (record.job_id.clone(), Self::apply_status(record, status)))
            .collect();

        if updated.is_empty() {
            return Ok(0);
        }
        self.batch_put(&updated)?;
        Ok(updated.len())
    }

    fn delete_jobs_matching_sync(&self, filter: &JobFilter) -> Result<usize> {
        let keys: Vec<JobId> = self
            .scan_records_sync()?
            .into_iter()
            .filter(|record| filter.matches(record))
            .map(|record| record.job_id)
            .collect();

        if keys.is_empty() {
            return Ok(0);
        }
        self.batch_delete(&keys)?;
        Ok(keys.len())
    }
}

fn join_error(e: tokio::task::JoinError) -> JobError {
    JobError::Other(format!("spawn_blocking join error: {}", e))
}

// Every synchronous storage call runs on the blocking pool so callers never
// stall the async runtime.
#[async_trait]
impl JobStore for JobsStore {
    async fn insert_job(&self, record: JobRecord) -> Result<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.insert_job_sync(&record))
            .await
            .map_err(join_error)?
    }

    async fn get_job(&self, job_id: &JobId) -> Result<Option<JobRecord>> {
        let store = self.clone();
        let job_id = job_id.clone();
        tokio::task::spawn_blocking(move || store.get_job_sync(&job_id))
            .await
            .map_err(join_error)?
    }

    async fn list_jobs_for_engine(&self, engine_id: &EngineId) -> Result<Vec<JobRecord>> {
        let store = self.clone();
        let engine_id = engine_id.clone();
        tokio::task::spawn_blocking(move || store.list_jobs_for_engine_sync(&engine_id))
            .await
            .map_err(join_error)?
    }

    async fn update_job_status(&self, job_id: &JobId, status: JobStatus) -> Result<()> {
        let store = self.clone();
        let job_id = job_id.clone();
        tokio::task::spawn_blocking(move || store.update_job_status_sync(&job_id, status))
            .await
            .map_err(join_error)?
    }

    async fn update_jobs_matching(&self, filter: JobFilter, status: JobStatus) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.update_jobs_matching_sync(&filter, status))
            .await
            .map_err(join_error)?
    }

    async fn delete_job(&self, job_id: &JobId) -> Result<()> {
        let store = self.clone();
        let job_id = job_id.clone();
        tokio::task::spawn_blocking(move || store.delete_job_sync(&job_id))
            .await
            .map_err(join_error)?
    }

    async fn delete_jobs_matching(&self, filter: JobFilter) -> Result<usize> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.delete_jobs_matching_sync(&filter))
            .await
            .map_err(join_error)?
    }
}
