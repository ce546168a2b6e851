//! RocksDB database initialization.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{Options, DB};

use crate::storage_trait::{Result, StorageError};

/// Opens (or creates) a RocksDB database with the given partitions as
/// column families.
///
/// Column families already present in the database are preserved; missing
/// ones from `partitions` are created. RocksDB requires every existing
/// column family to be listed at open, so the set is merged from
/// `DB::list_cf` and the requested partitions.
pub fn open_db<P: AsRef<Path>>(path: P, partitions: &[&str]) -> Result<Arc<DB>> {
    let path = path.as_ref();

    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);

    let mut cf_names = DB::list_cf(&opts, path).unwrap_or_else(|_| vec!["default".to_string()]);
    for partition in partitions {
        if !cf_names.iter().any(|name| name == partition) {
            cf_names.push(partition.to_string());
        }
    }

    let db = DB::open_cf(&opts, path, cf_names).map_err(|e| StorageError::IoError(e.to_string()))?;

    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_partitions() {
        let dir = TempDir::new().unwrap();
        let db = open_db(dir.path(), &["jobs", "engines"]).unwrap();
        assert!(db.cf_handle("jobs").is_some());
        assert!(db.cf_handle("engines").is_some());
    }

    #[test]
    fn test_reopen_preserves_data_and_partitions() {
        let dir = TempDir::new().unwrap();
        {
            let db = open_db(dir.path(), &["jobs"]).unwrap();
            let cf = db.cf_handle("jobs").unwrap();
            db.put_cf(cf, b"k", b"v").unwrap();
        }

        // Reopen without listing the partition explicitly; list_cf finds it.
        let db = open_db(dir.path(), &[]).unwrap();
        let cf = db.cf_handle("jobs").unwrap();
        assert_eq!(db.get_cf(cf, b"k").unwrap(), Some(b"v".to_vec()));
    }
}
