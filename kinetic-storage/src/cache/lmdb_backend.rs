//! LMDB-backed cache implementation with tenant isolation.
//!
//! Uses the heed crate (Rust bindings for LMDB) as a persistent,
//! memory-mapped home for the alternatives cache table.
//!
//! Rows are keyed by the 66-byte [`AlternativesCacheKey`] encoding, which
//! sorts by tenant and then exercise, so invalidation of one tenant or one
//! exercise is a prefix scan. Values are JSON-encoded [`CacheEntry`] rows.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use kinetic_core::{EntityId, KineticResult};

use super::key::AlternativesCacheKey;
use super::traits::{AlternativesCacheBackend, CacheEntry, CacheStats};

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for kinetic_core::KineticError {
    fn from(e: LmdbCacheError) -> Self {
        match e {
            LmdbCacheError::Serialization(reason) | LmdbCacheError::Deserialization(reason) => {
                kinetic_core::KineticError::Storage(kinetic_core::StorageError::Serialization {
                    reason,
                })
            }
            other => kinetic_core::KineticError::Storage(
                kinetic_core::StorageError::TransactionFailed {
                    reason: other.to_string(),
                },
            ),
        }
    }
}

fn txn_err(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

/// LMDB-backed alternatives cache.
///
/// # Example
///
/// ```ignore
/// let backend = LmdbCacheBackend::new("/var/lib/kinetic/cache", 256)?;
/// let cache = AlternativesCache::from_config(Arc::new(backend), &config);
/// ```
pub struct LmdbCacheBackend {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
}

impl LmdbCacheBackend {
    /// Create a new LMDB cache backend.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per path by this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        Ok(Self { env, db })
    }

    fn decode_entry(bytes: &[u8]) -> Result<CacheEntry, LmdbCacheError> {
        serde_json::from_slice(bytes).map_err(|e| LmdbCacheError::Deserialization(e.to_string()))
    }

    fn encode_entry(entry: &CacheEntry) -> Result<Vec<u8>, LmdbCacheError> {
        serde_json::to_vec(entry).map_err(|e| LmdbCacheError::Serialization(e.to_string()))
    }

    /// Collect every stored key starting with `prefix`.
    fn collect_keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, LmdbCacheError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let mut keys = Vec::new();
        let iter = self.db.prefix_iter(&rtxn, prefix).map_err(txn_err)?;
        for result in iter {
            let (key, _) = result.map_err(txn_err)?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    fn delete_keys(&self, keys: &[Vec<u8>]) -> Result<u64, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let mut deleted = 0u64;
        for key in keys {
            if self.db.delete(&mut wtxn, key).map_err(txn_err)? {
                deleted += 1;
            }
        }
        wtxn.commit().map_err(txn_err)?;
        Ok(deleted)
    }

    /// Drop every cached list of a tenant. Returns the number of rows removed.
    pub fn invalidate_tenant(&self, tenant_id: EntityId) -> KineticResult<u64> {
        let keys = self.collect_keys_with_prefix(&AlternativesCacheKey::tenant_prefix(tenant_id))?;
        Ok(self.delete_keys(&keys)?)
    }

    /// Drop every cached list for one source exercise of a tenant, across
    /// all equipment sets and difficulty filters.
    pub fn invalidate_exercise(
        &self,
        tenant_id: EntityId,
        exercise_id: EntityId,
    ) -> KineticResult<u64> {
        let prefix = AlternativesCacheKey::exercise_prefix(tenant_id, exercise_id);
        let keys = self.collect_keys_with_prefix(&prefix)?;
        Ok(self.delete_keys(&keys)?)
    }
}

#[async_trait]
impl AlternativesCacheBackend for LmdbCacheBackend {
    async fn get(&self, key: &AlternativesCacheKey) -> KineticResult<Option<CacheEntry>> {
        let encoded_key = key.encode();
        let rtxn = self.env.read_txn().map_err(txn_err)?;

        match self.db.get(&rtxn, &encoded_key).map_err(txn_err)? {
            Some(bytes) => Ok(Some(Self::decode_entry(bytes)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, key: &AlternativesCacheKey, entry: &CacheEntry) -> KineticResult<()> {
        let encoded_key = key.encode();
        let value = Self::encode_entry(entry)?;

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, &encoded_key, &value)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn record_hit(
        &self,
        key: &AlternativesCacheKey,
        at: DateTime<Utc>,
    ) -> KineticResult<()> {
        let encoded_key = key.encode();
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;

        let existing = match self.db.get(&wtxn, &encoded_key).map_err(txn_err)? {
            Some(bytes) => Some(Self::decode_entry(bytes)?),
            None => None,
        };

        if let Some(mut entry) = existing {
            entry.record_hit(at);
            let value = Self::encode_entry(&entry)?;
            self.db
                .put(&mut wtxn, &encoded_key, &value)
                .map_err(txn_err)?;
        }

        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    async fn stats(&self) -> KineticResult<CacheStats> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let entry_count = self.db.len(&rtxn).map_err(txn_err)?;
        Ok(CacheStats {
            entry_count,
            ..Default::default()
        })
    }
}

impl std::fmt::Debug for LmdbCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbCacheBackend")
            .field("path", &self.env.path())
            .finish()
    }
}
