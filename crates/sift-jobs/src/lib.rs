//! # sift-jobs
//!
//! Job lifecycle tracking for Sift engines.
//!
//! Every asynchronous operation an engine starts (primarily training runs)
//! is tracked as a job: persisted in a durable store that survives process
//! restarts, mirrored in an in-memory registry that holds the live cancel
//! handles, and reported with a read-time expiration overlay.
//!
//! ## Architecture
//!
//! ```text
//! JobsManager
//! ├── JobStore          (durable records; authoritative for status/listing)
//! ├── LiveJobRegistry   (in-process cancel capabilities; dies with process)
//! └── ExecutionCanceller (tells the remote execution backend to stop)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sift_commons::{EngineId, JobStatus, JobsSettings};
//! use sift_jobs::{Cancellable, JobsManager, JobsStore, NoopExecutionCanceller};
//! use sift_store::{open_db, RocksDbBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = open_db("./data", &[sift_jobs::JOBS_PARTITION])?;
//! let store = JobsStore::new(Arc::new(RocksDbBackend::new(db)));
//! let manager = JobsManager::new(
//!     Arc::new(store),
//!     Arc::new(NoopExecutionCanceller),
//!     &JobsSettings::default(),
//! );
//!
//! // Jobs left over from a previous run cannot be resumed; fail them.
//! manager.abort_executing_jobs().await?;
//!
//! let engine_id = EngineId::new("engine-1");
//! let description = manager.add_job(
//!     engine_id.clone(),
//!     Cancellable::noop(),
//!     "nightly training",
//!     JobStatus::Queued,
//! );
//!
//! manager.finish_job(&description.job_id);
//! let jobs = manager.get_active_job_descriptions(&engine_id).await?;
//! # let _ = jobs;
//! # Ok(())
//! # }
//! ```

pub mod cancellable;
pub mod canceller;
pub mod error;
pub mod manager;
pub mod registry;
pub mod store;

pub use cancellable::Cancellable;
pub use canceller::{ExecutionCanceller, NoopExecutionCanceller};
pub use error::{JobError, Result};
pub use manager::JobsManager;
pub use registry::{LiveJob, LiveJobRegistry};
pub use store::{JobFilter, JobStore, JobsStore, JOBS_PARTITION};
