//! In-memory registry of live, cancellable jobs.
//!
//! The registry maps each engine id to the jobs currently live in this
//! process, pairing the public [`JobDescription`] with the [`Cancellable`]
//! handle that can stop the run. It is purely a capability cache: the
//! durable store remains authoritative for status and for answering "what
//! jobs exist". Entries are reconciled best-effort: a job finishing
//! concurrently with a cancel may leave or remove an entry in either order,
//! and readers must tolerate both.

use dashmap::DashMap;
use log::debug;
use sift_commons::{EngineId, JobDescription, JobId};

use crate::cancellable::Cancellable;

/// One live job: the cancel capability plus the description reported for it.
#[derive(Debug, Clone)]
pub struct LiveJob {
    pub cancellable: Cancellable,
    pub description: JobDescription,
}

/// Concurrency-safe mapping from engine id to its live jobs.
///
/// Mutations under the same engine id are atomic with respect to each other
/// (per-entry locking); no caller-side locking is needed.
#[derive(Debug, Default)]
pub struct LiveJobRegistry {
    engines: DashMap<EngineId, Vec<LiveJob>>,
}

impl LiveJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live job under `engine_id`, most recent first.
    pub fn put(&self, engine_id: EngineId, cancellable: Cancellable, description: JobDescription) {
        let job = LiveJob {
            cancellable,
            description,
        };
        self.engines.entry(engine_id).or_default().insert(0, job);
    }

    /// Replaces the entry for `job_id` with a new description and cancel
    /// handle. Returns false when no live entry matches.
    pub fn replace(
        &self,
        engine_id: &EngineId,
        job_id: &JobId,
        cancellable: Cancellable,
        description: JobDescription,
    ) -> bool {
        let Some(mut jobs) = self.engines.get_mut(engine_id) else {
            return false;
        };
        match jobs.iter_mut().find(|job| &job.description.job_id == job_id) {
            Some(job) => {
                *job = LiveJob {
                    cancellable,
                    description,
                };
                true
            }
            None => false,
        }
    }

    /// Looks up the live entry for `job_id` under `engine_id`.
    pub fn find(&self, engine_id: &EngineId, job_id: &JobId) -> Option<LiveJob> {
        self.engines.get(engine_id).and_then(|jobs| {
            jobs.iter()
                .find(|job| &job.description.job_id == job_id)
                .cloned()
        })
    }

    /// Takes and clears every live entry for `engine_id`.
    pub fn remove_all(&self, engine_id: &EngineId) -> Vec<LiveJob> {
        self.engines
            .remove(engine_id)
            .map(|(_, jobs)| jobs)
            .unwrap_or_default()
    }

    /// Removes `job_id` from whichever engine holds it.
    ///
    /// Used when a job completes and the owning engine id is not known at
    /// the call site.
    pub fn remove_globally(&self, job_id: &JobId) -> Option<LiveJob> {
        let mut removed = None;
        let mut emptied = None;

        for mut entry in self.engines.iter_mut() {
            if let Some(pos) = entry
                .value()
                .iter()
                .position(|job| &job.description.job_id == job_id)
            {
                removed = Some(entry.value_mut().remove(pos));
                if entry.value().is_empty() {
                    emptied = Some(entry.key().clone());
                }
                break;
            }
        }

        // Drop empty engine slots outside the iteration to avoid holding
        // two locks on the same shard.
        if let Some(engine_id) = emptied {
            self.engines.remove_if(&engine_id, |_, jobs| jobs.is_empty());
        }

        if removed.is_some() {
            debug!("[{}] removed live job entry", job_id);
        }
        removed
    }

    /// Number of live jobs currently registered for `engine_id`.
    pub fn live_count(&self, engine_id: &EngineId) -> usize {
        self.engines
            .get(engine_id)
            .map(|jobs| jobs.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_commons::JobStatus;
    use std::sync::Arc;

    fn description(job_id: &str) -> JobDescription {
        JobDescription {
            job_id: JobId::new(job_id),
            status: JobStatus::Queued,
            comment: String::new(),
            created_at: 0,
            completed_at: None,
        }
    }

    #[test]
    fn test_put_prepends() {
        let registry = LiveJobRegistry::new();
        let engine = EngineId::new("engine-1");

        registry.put(engine.clone(), Cancellable::noop(), description("a"));
        registry.put(engine.clone(), Cancellable::noop(), description("b"));

        let jobs = registry.remove_all(&engine);
        assert_eq!(jobs[0].description.job_id, JobId::new("b"));
        assert_eq!(jobs[1].description.job_id, JobId::new("a"));
    }

    #[test]
    fn test_replace_swaps_description() {
        let registry = LiveJobRegistry::new();
        let engine = EngineId::new("engine-1");
        registry.put(engine.clone(), Cancellable::noop(), description("a"));

        let mut updated = description("a");
        updated.status = JobStatus::Executing;
        assert!(registry.replace(&engine, &JobId::new("a"), Cancellable::noop(), updated));

        let live = registry.find(&engine, &JobId::new("a")).unwrap();
        assert_eq!(live.description.status, JobStatus::Executing);

        // Unknown job id is a no-op.
        assert!(!registry.replace(
            &engine,
            &JobId::new("z"),
            Cancellable::noop(),
            description("z")
        ));
    }

    #[test]
    fn test_remove_globally_without_engine_id() {
        let registry = LiveJobRegistry::new();
        registry.put(EngineId::new("e1"), Cancellable::noop(), description("a"));
        registry.put(EngineId::new("e2"), Cancellable::noop(), description("b"));

        let removed = registry.remove_globally(&JobId::new("b")).unwrap();
        assert_eq!(removed.description.job_id, JobId::new("b"));
        assert_eq!(registry.live_count(&EngineId::new("e2")), 0);
        assert_eq!(registry.live_count(&EngineId::new("e1")), 1);

        assert!(registry.remove_globally(&JobId::new("b")).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_puts_are_not_lost() {
        let registry = Arc::new(LiveJobRegistry::new());
        let engine = EngineId::new("engine-1");

        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                registry.put(engine, Cancellable::noop(), description(&format!("job-{}", i)));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.live_count(&engine), 32);
    }
}
