//! RocksDB implementation of the StorageBackend trait.
//!
//! Maps the generic partition concept to RocksDB column families. Column
//! families are created when the database is opened (see
//! [`crate::rocksdb_init::open_db`]); `create_partition` on a live handle is
//! unsupported.

use std::sync::Arc;

use rocksdb::{ColumnFamily, Direction, IteratorMode, WriteBatch, DB};

use crate::storage_trait::{Operation, Partition, Result, StorageBackend, StorageError};

/// RocksDB-backed [`StorageBackend`].
pub struct RocksDbBackend {
    db: Arc<DB>,
}

impl RocksDbBackend {
    /// Creates a new RocksDB backend with the given database handle.
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }

    fn get_cf(&self, partition: &Partition) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))
    }
}

impl StorageBackend for RocksDbBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.get_cf(partition)?;
        self.db
            .get_cf(cf, key)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.get_cf(partition)?;
        self.db
            .put_cf(cf, key, value)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let cf = self.get_cf(partition)?;
        self.db
            .delete_cf(cf, key)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        let mut batch = WriteBatch::default();

        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    let cf = self.get_cf(&partition)?;
                    batch.put_cf(cf, key, value);
                }
                Operation::Delete { partition, key } => {
                    let cf = self.get_cf(&partition)?;
                    batch.delete_cf(cf, key);
                }
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.get_cf(partition)?;

        let mode = match prefix {
            Some(p) => IteratorMode::From(p, Direction::Forward),
            None => IteratorMode::Start,
        };

        let max = limit.unwrap_or(usize::MAX);
        let mut entries = Vec::new();

        for item in self.db.iterator_cf(cf, mode) {
            let (key, value) = item.map_err(|e| StorageError::IoError(e.to_string()))?;
            if let Some(p) = prefix {
                if !key.starts_with(p) {
                    break;
                }
            }
            entries.push((key.to_vec(), value.to_vec()));
            if entries.len() >= max {
                break;
            }
        }

        Ok(entries)
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.db.cf_handle(partition.name()).is_some()
    }

    fn create_partition(&self, _partition: &Partition) -> Result<()> {
        Err(StorageError::Unsupported(
            "column families are fixed at open; pass the partition to open_db".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rocksdb_init::open_db;
    use tempfile::TempDir;

    fn test_backend(dir: &TempDir) -> RocksDbBackend {
        let db = open_db(dir.path(), &["jobs"]).unwrap();
        RocksDbBackend::new(db)
    }

    #[test]
    fn test_put_get_delete() {
        let dir = TempDir::new().unwrap();
        let backend = test_backend(&dir);
        let partition = Partition::new("jobs");

        backend.put(&partition, b"k1", b"v1").unwrap();
        assert_eq!(backend.get(&partition, b"k1").unwrap(), Some(b"v1".to_vec()));

        backend.delete(&partition, b"k1").unwrap();
        assert_eq!(backend.get(&partition, b"k1").unwrap(), None);
    }

    #[test]
    fn test_missing_partition_is_an_error() {
        let dir = TempDir::new().unwrap();
        let backend = test_backend(&dir);
        let partition = Partition::new("absent");

        assert!(!backend.partition_exists(&partition));
        match backend.get(&partition, b"k") {
            Err(StorageError::PartitionNotFound(name)) => assert_eq!(name, "absent"),
            other => panic!("expected PartitionNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_create_partition_unsupported() {
        let dir = TempDir::new().unwrap();
        let backend = test_backend(&dir);

        let result = backend.create_partition(&Partition::new("late"));
        assert!(matches!(result, Err(StorageError::Unsupported(_))));
    }

    #[test]
    fn test_scan_prefix_and_limit() {
        let dir = TempDir::new().unwrap();
        let backend = test_backend(&dir);
        let partition = Partition::new("jobs");

        backend.put(&partition, b"a:1", b"1").unwrap();
        backend.put(&partition, b"a:2", b"2").unwrap();
        backend.put(&partition, b"b:1", b"3").unwrap();

        let prefixed = backend.scan(&partition, Some(b"a:"), None).unwrap();
        assert_eq!(prefixed.len(), 2);
        assert_eq!(prefixed[0].0, b"a:1".to_vec());

        let limited = backend.scan(&partition, None, Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_batch_is_applied_atomically() {
        let dir = TempDir::new().unwrap();
        let backend = test_backend(&dir);
        let partition = Partition::new("jobs");
        backend.put(&partition, b"old", b"x").unwrap();

        backend
            .batch(vec![
                Operation::Put {
                    partition: partition.clone(),
                    key: b"new".to_vec(),
                    value: b"y".to_vec(),
                },
                Operation::Delete {
                    partition: partition.clone(),
                    key: b"old".to_vec(),
                },
            ])
            .unwrap();

        assert_eq!(backend.get(&partition, b"new").unwrap(), Some(b"y".to_vec()));
        assert_eq!(backend.get(&partition, b"old").unwrap(), None);
    }
}
