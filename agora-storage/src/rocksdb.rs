use rocksdb::{
    ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options, WriteBatchWithTransaction,
};

use crate::error::StorageError;
use crate::traits::{BatchOp, BatchWriter, KvPairs, KvStore};

/// Default column families for the Agora storage.
pub const DEFAULT_CF: &str = "default";
pub const JOURNAL_CF: &str = "journal";
pub const SNAPSHOT_CF: &str = "snapshots";

/// RocksDB-backed key-value store with column family support.
pub struct RocksDbStore {
    db: DBWithThreadMode<MultiThreaded>,
}

impl RocksDbStore {
    /// Open a RocksDB store at the given path with the specified column
    /// families. If `cf_names` is None, uses the default set.
    pub fn new(path: &str, cf_names: Option<&[&str]>) -> Result<Self, StorageError> {
        let cfs = cf_names.unwrap_or(&[DEFAULT_CF, JOURNAL_CF, SNAPSHOT_CF]);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = cfs
            .iter()
            .map(|name| {
                let cf_opts = Options::default();
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db =
            DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    /// Get a value from a specific column family.
    pub fn get_cf(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ReadError {
                reason: format!("Column family '{}' not found", cf_name),
            })?;
        let result = self.db.get_cf(&cf, key)?;
        Ok(result)
    }

    /// Put a value into a specific column family.
    pub fn put_cf(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::WriteError {
                reason: format!("Column family '{}' not found", cf_name),
            })?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    /// Delete a key from a specific column family.
    pub fn delete_cf(&self, cf_name: &str, key: &[u8]) -> Result<(), StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::WriteError {
                reason: format!("Column family '{}' not found", cf_name),
            })?;
        self.db.delete_cf(&cf, key)?;
        Ok(())
    }
}

impl KvStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let result = self.db.get(key)?;
        Ok(result)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.db.put(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.db.delete(key)?;
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        let result = self.db.get(key)?;
        Ok(result.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<KvPairs, StorageError> {
        let iter = self.db.prefix_iterator(prefix);
        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::ReadError {
                reason: e.to_string(),
            })?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}

impl BatchWriter for RocksDbStore {
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let mut batch = WriteBatchWithTransaction::<false>::default();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    batch.put(&key, &value);
                }
                BatchOp::Delete { key } => {
                    batch.delete(&key);
                }
            }
        }
        self.db.write(batch)?;
        Ok(())
    }
}
