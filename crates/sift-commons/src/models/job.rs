//! Job entity and its public projection.
//!
//! A [`JobRecord`] is the durable representation of one tracked asynchronous
//! unit of work (typically a training run) owned by an engine. A
//! [`JobDescription`] is the projection of a record exposed to callers for
//! status reporting, with the owning engine id stripped.

use serde::{Deserialize, Serialize};

use crate::models::{EngineId, JobId, JobStatus};

/// Durable job record, keyed by the globally unique `job_id`.
///
/// ## Fields
/// - `engine_id`: owning engine's identifier
/// - `job_id`: globally unique identifier, generated at creation, immutable
/// - `status`: current [`JobStatus`]
/// - `comment`: free-text annotation, immutable after creation
/// - `created_at`: Unix timestamp in milliseconds, set at creation
/// - `completed_at`: Unix timestamp in milliseconds, set exactly once when
///   the job reaches a terminal status
/// - `expire_at`: `created_at + configured TTL`, computed once at creation;
///   meaningful only while the stored status is non-terminal
///
/// Persisted as JSON via the entity store; `status` serializes to one of the
/// six lowercase string tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub expire_at: i64,
    pub engine_id: EngineId,
    pub job_id: JobId,
    pub comment: String,
    pub status: JobStatus,
}

impl JobRecord {
    /// Mark the job successful.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.status = JobStatus::Successful;
        self.completed_at
            .get_or_insert(chrono::Utc::now().timestamp_millis());
        self
    }

    /// Mark the job failed.
    #[inline]
    pub fn fail(mut self) -> Self {
        self.status = JobStatus::Failed;
        self.completed_at
            .get_or_insert(chrono::Utc::now().timestamp_millis());
        self
    }

    /// Mark the job cancelled.
    #[inline]
    pub fn cancel(mut self) -> Self {
        self.status = JobStatus::Cancelled;
        self.completed_at
            .get_or_insert(chrono::Utc::now().timestamp_millis());
        self
    }

    /// Whether the record has outlived its TTL without reaching a terminal
    /// status.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        !self.status.is_terminal() && self.expire_at <= now_ms
    }

    /// The status callers observe at `now_ms`: the stored status, overlaid
    /// with [`JobStatus::Expired`] for a non-terminal record whose
    /// `expire_at` has passed. The stored value is never rewritten.
    pub fn effective_status(&self, now_ms: i64) -> JobStatus {
        if self.is_expired(now_ms) {
            JobStatus::Expired
        } else {
            self.status
        }
    }

    /// Builds the public projection of this record, applying the expiration
    /// overlay at `now_ms`.
    pub fn description(&self, now_ms: i64) -> JobDescription {
        JobDescription {
            job_id: self.job_id.clone(),
            status: self.effective_status(now_ms),
            comment: self.comment.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Public projection of a [`JobRecord`], used for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub job_id: JobId,
    pub status: JobStatus,
    pub comment: String,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: JobStatus, expire_at: i64) -> JobRecord {
        JobRecord {
            created_at: 1_770_000_000_000,
            completed_at: None,
            expire_at,
            engine_id: EngineId::new("engine-1"),
            job_id: JobId::new("job-1"),
            comment: "train".to_string(),
            status,
        }
    }

    #[test]
    fn test_finish_sets_completed_at_once() {
        let finished = record(JobStatus::Executing, i64::MAX).finish();
        assert_eq!(finished.status, JobStatus::Successful);
        let first = finished.completed_at.unwrap();

        // A later transition must not move the completion timestamp.
        let cancelled = finished.cancel();
        assert_eq!(cancelled.completed_at, Some(first));
    }

    #[test]
    fn test_expiration_overlay_for_non_terminal() {
        let now = 1_770_000_100_000;
        let stale = record(JobStatus::Queued, now - 1);
        assert_eq!(stale.effective_status(now), JobStatus::Expired);
        // The stored status is untouched by the overlay.
        assert_eq!(stale.status, JobStatus::Queued);

        let fresh = record(JobStatus::Executing, now + 1);
        assert_eq!(fresh.effective_status(now), JobStatus::Executing);
    }

    #[test]
    fn test_terminal_records_never_expire() {
        let now = 1_770_000_100_000;
        let done = record(JobStatus::Successful, now - 1);
        assert_eq!(done.effective_status(now), JobStatus::Successful);
    }

    #[test]
    fn test_description_drops_engine_id() {
        let now = 1_770_000_000_001;
        let rec = record(JobStatus::Queued, i64::MAX);
        let desc = rec.description(now);
        assert_eq!(desc.job_id, rec.job_id);
        assert_eq!(desc.status, JobStatus::Queued);
        assert_eq!(desc.comment, "train");
        assert_eq!(desc.created_at, rec.created_at);
        assert_eq!(desc.completed_at, None);

        let json = serde_json::to_string(&desc).unwrap();
        assert!(!json.contains("engine"));
        assert!(json.contains("\"status\":\"queued\""));
    }
}
