//! In-memory cache backend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kinetic_core::{KineticError, KineticResult, StorageError};

use super::key::AlternativesCacheKey;
use super::traits::{AlternativesCacheBackend, CacheEntry, CacheStats};

/// Map-backed cache rows, shared across clones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheBackend {
    rows: Arc<RwLock<HashMap<AlternativesCacheKey, CacheEntry>>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, live or expired.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> KineticError {
    KineticError::Storage(StorageError::LockPoisoned)
}

#[async_trait]
impl AlternativesCacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &AlternativesCacheKey) -> KineticResult<Option<CacheEntry>> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.get(key).cloned())
    }

    async fn upsert(&self, key: &AlternativesCacheKey, entry: &CacheEntry) -> KineticResult<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        rows.insert(key.clone(), entry.clone());
        Ok(())
    }

    async fn record_hit(
        &self,
        key: &AlternativesCacheKey,
        at: DateTime<Utc>,
    ) -> KineticResult<()> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        if let Some(entry) = rows.get_mut(key) {
            entry.record_hit(at);
        }
        Ok(())
    }

    async fn stats(&self) -> KineticResult<CacheStats> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(CacheStats {
            entry_count: rows.len() as u64,
            ..Default::default()
        })
    }
}
