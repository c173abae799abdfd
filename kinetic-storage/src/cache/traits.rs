//! Cache backend trait and the persisted cache row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kinetic_core::{KineticResult, ScoredAlternative};
use serde::{Deserialize, Serialize};

use super::key::AlternativesCacheKey;

/// Value of one row of the alternatives cache table. Backends store it
/// under its [`AlternativesCacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Ranked alternatives, best first.
    pub alternatives: Vec<ScoredAlternative>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Advisory telemetry. Concurrent hits may lose updates.
    pub hit_count: u64,
    pub last_hit_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Create a fresh entry with a zero hit count.
    pub fn new(
        alternatives: Vec<ScoredAlternative>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            alternatives,
            created_at,
            expires_at,
            hit_count: 0,
            last_hit_at: None,
        }
    }

    /// An entry is live only while its expiry is in the future.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Apply one hit to the advisory counters.
    pub fn record_hit(&mut self, at: DateTime<Utc>) {
        self.hit_count = self.hit_count.saturating_add(1);
        self.last_hit_at = Some(at);
    }
}

/// Storage for cached alternatives lists.
///
/// Backends are plain key-value stores: they neither filter expired rows nor
/// swallow errors. Both policies belong to [`AlternativesCache`].
///
/// [`AlternativesCache`]: super::store::AlternativesCache
#[async_trait]
pub trait AlternativesCacheBackend: Send + Sync {
    /// Read the row for a key, expired or not.
    async fn get(&self, key: &AlternativesCacheKey) -> KineticResult<Option<CacheEntry>>;

    /// Insert or overwrite the row for `key`.
    async fn upsert(&self, key: &AlternativesCacheKey, entry: &CacheEntry) -> KineticResult<()>;

    /// Increment the hit counter and stamp the last hit time.
    ///
    /// A missing row is not an error.
    async fn record_hit(&self, key: &AlternativesCacheKey, at: DateTime<Utc>)
        -> KineticResult<()>;

    /// Row statistics. Hits and misses are counted by the cache facade,
    /// which is the only layer that knows about expiry.
    async fn stats(&self) -> KineticResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired rows).
    pub misses: u64,
    /// Number of rows currently stored, live or expired.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
