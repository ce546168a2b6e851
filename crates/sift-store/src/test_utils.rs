//! Test utilities for sift-store and its dependents.
//!
//! [`InMemoryBackend`] implements [`StorageBackend`] over plain maps so
//! tests can run without touching disk. Partitions are created implicitly
//! on first write.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::storage_trait::{Operation, Partition, Result, StorageBackend};

type PartitionMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory implementation of [`StorageBackend`].
///
/// Every partition is a `BTreeMap`, so scans come back in key order like
/// they do from RocksDB. All mutation happens under a single lock, which
/// also makes `batch` trivially atomic.
#[derive(Default)]
pub struct InMemoryBackend {
    partitions: RwLock<HashMap<String, PartitionMap>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let partitions = self.partitions.read();
        Ok(partitions
            .get(partition.name())
            .and_then(|map| map.get(key).cloned()))
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let mut partitions = self.partitions.write();
        partitions
            .entry(partition.name().to_string())
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let mut partitions = self.partitions.write();
        if let Some(map) = partitions.get_mut(partition.name()) {
            map.remove(key);
        }
        Ok(())
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        // One lock acquisition for the whole batch keeps it atomic.
        let mut partitions = self.partitions.write();
        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    partitions
                        .entry(partition.name().to_string())
                        .or_default()
                        .insert(key, value);
                }
                Operation::Delete { partition, key } => {
                    if let Some(map) = partitions.get_mut(partition.name()) {
                        map.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let partitions = self.partitions.read();
        let Some(map) = partitions.get(partition.name()) else {
            return Ok(Vec::new());
        };

        let entries = map
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |p| key.starts_with(p)))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(entries)
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.partitions.read().contains_key(partition.name())
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        let mut partitions = self.partitions.write();
        partitions
            .entry(partition.name().to_string())
            .or_default();
        Ok(())
    }
}
