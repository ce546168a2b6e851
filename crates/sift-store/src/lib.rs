//! # sift-store
//!
//! Low-level key-value storage layer for Sift.
//!
//! This crate isolates all direct RocksDB interaction behind the
//! [`StorageBackend`] trait so the rest of the system stays free of
//! storage-engine dependencies:
//!
//! ```text
//! sift-jobs (business logic)
//!     ↓
//! sift-store (K/V operations)
//!     ↓
//! RocksDB (storage engine)
//! ```
//!
//! Typed access goes through [`EntityStore`], which layers key safety and
//! JSON serialization on top of the raw byte operations. Tests (here and in
//! dependent crates) use [`test_utils::InMemoryBackend`].

pub mod entity_store;
pub mod rocksdb_impl;
pub mod rocksdb_init;
pub mod storage_trait;
pub mod test_utils;

pub use entity_store::EntityStore;
pub use rocksdb_impl::RocksDbBackend;
pub use rocksdb_init::open_db;
pub use storage_trait::{Operation, Partition, StorageBackend, StorageError};

// Re-export StorageKey from sift-commons to avoid import inconsistency.
pub use sift_commons::StorageKey;
