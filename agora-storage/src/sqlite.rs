use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::error::StorageError;
use crate::traits::{BatchOp, BatchWriter, KvPairs, KvStore};

/// SQLite-backed key-value store.
/// Uses a single `kv` table with BLOB key and BLOB value columns.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    /// Use `:memory:` for an in-memory database (useful for tests).
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (key BLOB PRIMARY KEY, value BLOB NOT NULL)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::ReadError {
            reason: e.to_string(),
        })?;
        let mut stmt = conn.prepare_cached("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => {
                let value: Vec<u8> = row.get(0)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::WriteError {
            reason: e.to_string(),
        })?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::WriteError {
            reason: e.to_string(),
        })?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::ReadError {
            reason: e.to_string(),
        })?;
        let mut stmt = conn.prepare_cached("SELECT 1 FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        Ok(rows.next()?.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<KvPairs, StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::ReadError {
            reason: e.to_string(),
        })?;

        // Range query against an exclusive upper bound derived from the
        // prefix; without one (all-0xFF prefix) fall back to filtering.
        let upper_bound = increment_prefix(prefix);

        let mut results = Vec::new();
        match upper_bound {
            Some(ref ub) => {
                let mut stmt = conn.prepare_cached(
                    "SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 ORDER BY key",
                )?;
                let mut rows = stmt.query(params![prefix, ub])?;
                while let Some(row) = rows.next()? {
                    let k: Vec<u8> = row.get(0)?;
                    let v: Vec<u8> = row.get(1)?;
                    results.push((k, v));
                }
            }
            None => {
                let mut stmt =
                    conn.prepare_cached("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key")?;
                let mut rows = stmt.query(params![prefix])?;
                while let Some(row) = rows.next()? {
                    let k: Vec<u8> = row.get(0)?;
                    if !k.starts_with(prefix) {
                        break;
                    }
                    let v: Vec<u8> = row.get(1)?;
                    results.push((k, v));
                }
            }
        }

        Ok(results)
    }
}

impl BatchWriter for SqliteStore {
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::BatchError {
            reason: e.to_string(),
        })?;
        let tx = conn.unchecked_transaction()?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    tx.execute(
                        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                        params![key, value],
                    )?;
                }
                BatchOp::Delete { key } => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Increment a byte prefix to compute an exclusive upper bound.
/// Returns None if the prefix is all 0xFF bytes (no upper bound).
fn increment_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut result = prefix.to_vec();
    for i in (0..result.len()).rev() {
        if result[i] < 0xFF {
            result[i] += 1;
            result.truncate(i + 1);
            return Some(result);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> SqliteStore {
        SqliteStore::new(":memory:").unwrap()
    }

    #[test]
    fn test_basic_crud() {
        let store = make_store();
        let key = b"acct:01";
        let value = b"state";

        store.put(key, value).unwrap();
        assert_eq!(store.get(key).unwrap(), Some(value.to_vec()));
        assert!(store.exists(key).unwrap());
        assert!(!store.exists(b"acct:02").unwrap());

        store.delete(key).unwrap();
        assert_eq!(store.get(key).unwrap(), None);
        assert!(!store.exists(key).unwrap());
    }

    #[test]
    fn test_overwrite() {
        let store = make_store();
        store.put(b"k", b"first").unwrap();
        store.put(b"k", b"second").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_prefix_scan_is_ordered() {
        let store = make_store();
        store.put(b"seq:03", b"c").unwrap();
        store.put(b"seq:01", b"a").unwrap();
        store.put(b"seq:02", b"b").unwrap();
        store.put(b"other:09", b"x").unwrap();

        let results = store.prefix_scan(b"seq:").unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, b"seq:01".to_vec());
        assert_eq!(results[1].0, b"seq:02".to_vec());
        assert_eq!(results[2].0, b"seq:03".to_vec());
    }

    #[test]
    fn test_prefix_scan_all_ff_prefix() {
        let store = make_store();
        store.put(&[0xFF, 0xFF, 0x01], b"a").unwrap();
        store.put(&[0xFF, 0xFE], b"b").unwrap();

        let results = store.prefix_scan(&[0xFF, 0xFF]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, vec![0xFF, 0xFF, 0x01]);
    }

    #[test]
    fn test_batch_put_and_delete() {
        let store = make_store();
        store.put(b"stale", b"value").unwrap();

        store
            .write_batch(vec![
                BatchOp::Put {
                    key: b"seq:01".to_vec(),
                    value: b"a".to_vec(),
                },
                BatchOp::Put {
                    key: b"seq:02".to_vec(),
                    value: b"b".to_vec(),
                },
                BatchOp::Delete {
                    key: b"stale".to_vec(),
                },
            ])
            .unwrap();

        assert_eq!(store.get(b"seq:01").unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.get(b"seq:02").unwrap(), Some(b"b".to_vec()));
        assert_eq!(store.get(b"stale").unwrap(), None);
    }

    #[test]
    fn test_get_nonexistent() {
        let store = make_store();
        assert_eq!(store.get(b"no_such_key").unwrap(), None);
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = std::env::temp_dir().join(format!(
            "agora_sqlite_test_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kv.db");
        let path_str = path.to_str().unwrap();

        {
            let store = SqliteStore::new(path_str).unwrap();
            store.put(b"k", b"v").unwrap();
        }
        {
            let store = SqliteStore::new(path_str).unwrap();
            assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
