//! Keyed byte storage.
//!
//! Voice prints are persisted as opaque encoded blobs under string keys.
//! [`MemoryStore`] keeps everything in a map and is what the tests use;
//! [`RedbStore`] writes through to a single-file redb database.

pub mod memory;
pub mod redb;

use std::fmt;

use thiserror::Error;

/// Errors that can occur in KV store operations.
#[derive(Error, Debug)]
pub enum KVError {
    #[error("kv: storage error: {0}")]
    Storage(String),

    #[error("kv: lock poisoned")]
    Poisoned,
}

/// Result type for KV operations.
pub type KVResult<T> = Result<T, KVError>;

/// Key-value store trait.
///
/// Every call is atomic on its own. Callers that need read-modify-write
/// semantics across calls serialize them themselves.
pub trait KVStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &[u8]) -> KVResult<()>;

    /// Remove a key. Returns whether a value was present.
    fn delete(&self, key: &str) -> KVResult<bool>;

    /// Return all entries whose key starts with `prefix`, sorted by key.
    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>>;
}

impl fmt::Debug for dyn KVStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KVStore {{ ... }}")
    }
}

pub use memory::MemoryStore;
pub use redb::RedbStore;
