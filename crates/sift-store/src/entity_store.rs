//! Type-safe entity storage with generic key types.
//!
//! The [`EntityStore<K, V>`] trait sits on top of [`StorageBackend`] to
//! provide strongly-typed, serialized access to entities:
//!
//! ```text
//! EntityStore<K, V>        ← typed entity CRUD (this file)
//!     ↓
//! StorageBackend           ← generic K/V operations (storage_trait.rs)
//!     ↓
//! RocksDB / in-memory      ← actual storage implementation
//! ```
//!
//! Typed keys prevent wrong-key bugs at compile time: a store keyed by
//! `JobId` will not accept an `EngineId`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sift_commons::StorageKey;

use crate::storage_trait::{Operation, Partition, Result, StorageBackend, StorageError};

/// Trait for typed entity storage with automatic serialization.
///
/// ## Type Parameters
/// - `K`: key type implementing [`StorageKey`]
/// - `V`: entity type, `Serialize + Deserialize`
///
/// ## Required methods
/// - `backend()`: the storage backend
/// - `partition()`: partition name for this entity type
///
/// Provided CRUD methods serialize entities as JSON by default; override
/// `serialize`/`deserialize` for other formats.
pub trait EntityStore<K, V>
where
    K: StorageKey,
    V: Serialize + for<'de> Deserialize<'de>,
{
    /// Returns a reference to the storage backend.
    fn backend(&self) -> &Arc<dyn StorageBackend>;

    /// Returns the partition name for this entity type.
    fn partition(&self) -> &str;

    /// Serializes an entity to bytes.
    fn serialize(&self, entity: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(entity).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Deserializes bytes to an entity.
    fn deserialize(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Stores an entity with the given key.
    fn put(&self, key: &K, entity: &V) -> Result<()> {
        let partition = Partition::new(self.partition());
        let value = self.serialize(entity)?;
        self.backend().put(&partition, &key.storage_key(), &value)
    }

    /// Retrieves an entity by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, key: &K) -> Result<Option<V>> {
        let partition = Partition::new(self.partition());
        match self.backend().get(&partition, &key.storage_key())? {
            Some(bytes) => Ok(Some(self.deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Removes an entity by key. Idempotent.
    fn delete(&self, key: &K) -> Result<()> {
        let partition = Partition::new(self.partition());
        self.backend().delete(&partition, &key.storage_key())
    }

    /// Stores multiple entities atomically in one batch.
    fn batch_put(&self, entries: &[(K, V)]) -> Result<()> {
        let partition = Partition::new(self.partition());
        let operations: Result<Vec<Operation>> = entries
            .iter()
            .map(|(key, entity)| {
                let value = self.serialize(entity)?;
                Ok(Operation::Put {
                    partition: partition.clone(),
                    key: key.storage_key(),
                    value,
                })
            })
            .collect();

        self.backend().batch(operations?)
    }

    /// Removes multiple entities atomically in one batch.
    fn batch_delete(&self, keys: &[K]) -> Result<()> {
        let partition = Partition::new(self.partition());
        let operations: Vec<Operation> = keys
            .iter()
            .map(|key| Operation::Delete {
                partition: partition.clone(),
                key: key.storage_key(),
            })
            .collect();

        self.backend().batch(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InMemoryBackend;
    use sift_commons::JobId;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: JobId,
        body: String,
    }

    struct NoteStore {
        backend: Arc<dyn StorageBackend>,
    }

    impl EntityStore<JobId, Note> for NoteStore {
        fn backend(&self) -> &Arc<dyn StorageBackend> {
            &self.backend
        }

        fn partition(&self) -> &str {
            "notes"
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: JobId::new(id),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_put_get_delete() {
        let store = NoteStore {
            backend: Arc::new(InMemoryBackend::new()),
        };

        let n = note("n1", "hello");
        store.put(&n.id, &n).unwrap();
        assert_eq!(store.get(&n.id).unwrap(), Some(n.clone()));

        store.delete(&n.id).unwrap();
        assert_eq!(store.get(&n.id).unwrap(), None);
        // Deleting again is a no-op.
        store.delete(&n.id).unwrap();
    }

    #[test]
    fn test_batch_put_and_delete() {
        let store = NoteStore {
            backend: Arc::new(InMemoryBackend::new()),
        };

        let entries: Vec<(JobId, Note)> = (0..3)
            .map(|i| {
                let n = note(&format!("n{}", i), "x");
                (n.id.clone(), n)
            })
            .collect();
        store.batch_put(&entries).unwrap();

        for (id, n) in &entries {
            assert_eq!(store.get(id).unwrap().as_ref(), Some(n));
        }

        let keys: Vec<JobId> = entries.iter().map(|(id, _)| id.clone()).collect();
        store.batch_delete(&keys).unwrap();
        for id in &keys {
            assert_eq!(store.get(id).unwrap(), None);
        }
    }

    #[test]
    fn test_get_with_corrupt_bytes_fails() {
        let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryBackend::new());
        let store = NoteStore {
            backend: backend.clone(),
        };

        let id = JobId::new("broken");
        backend
            .put(&Partition::new("notes"), &id.storage_key(), b"not json")
            .unwrap();

        match store.get(&id) {
            Err(StorageError::SerializationError(_)) => {}
            other => panic!("expected serialization error, got {:?}", other),
        }
    }
}
