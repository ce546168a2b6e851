//! # sift-commons
//!
//! Shared types and configuration for Sift.
//!
//! This crate provides the foundational types used across all Sift crates
//! (sift-store, sift-jobs, and the server that hosts them):
//!
//! - Type-safe identifier wrappers: [`EngineId`], [`JobId`]
//! - The job data model: [`JobRecord`], [`JobDescription`], [`JobStatus`]
//! - The [`StorageKey`] trait used by typed entity stores
//! - TOML-backed configuration: [`SiftConfig`], [`JobsSettings`]
//!
//! ## Example
//!
//! ```rust
//! use sift_commons::{EngineId, JobId, JobStatus};
//!
//! let engine_id = EngineId::new("engine-1");
//! let job_id = JobId::new("9f3b2c44");
//! assert_eq!(JobStatus::Queued.as_str(), "queued");
//! assert_eq!(engine_id.as_str(), "engine-1");
//! # let _ = job_id;
//! ```

pub mod config;
pub mod models;
pub mod storage;

pub use config::{JobsSettings, SiftConfig};
pub use models::{EngineId, JobDescription, JobId, JobRecord, JobStatus};
pub use storage::StorageKey;
