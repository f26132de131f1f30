//! Storage abstraction for the Agora engine.
//!
//! Provides a [`KvStore`](traits::KvStore) trait with memory, SQLite, and RocksDB
//! backends, plus a journal store that persists accepted transitions and
//! engine snapshots for crash recovery.

pub mod error;
pub mod journal;
pub mod memory;
pub mod rocksdb;
pub mod sqlite;
pub mod traits;
