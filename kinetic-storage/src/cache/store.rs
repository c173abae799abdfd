//! Best-effort cache facade used by the alternatives engine.
//!
//! The facade owns the policies that backends do not: lazy expiry, the
//! stored list width, fire-and-forget hit telemetry and error swallowing.
//! A cache failure never fails a request; it is logged and treated as a
//! miss (on read) or ignored (on write).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use kinetic_core::{AlternativesConfig, KineticResult, ScoredAlternative};
use tracing::{debug, warn};

use super::key::AlternativesCacheKey;
use super::traits::{AlternativesCacheBackend, CacheEntry, CacheStats};

/// Alternatives cache over any [`AlternativesCacheBackend`].
///
/// # Example
///
/// ```ignore
/// let cache = AlternativesCache::from_config(Arc::new(InMemoryCacheBackend::new()), &config);
/// if let Some(hit) = cache.check_cache(&key).await {
///     return hit;
/// }
/// cache.save_to_cache(&key, ranked).await;
/// ```
pub struct AlternativesCache<B: AlternativesCacheBackend + 'static> {
    backend: Arc<B>,
    ttl: Duration,
    width: usize,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<B: AlternativesCacheBackend + 'static> AlternativesCache<B> {
    /// Create a cache storing up to `width` alternatives per entry for `ttl`.
    pub fn new(backend: Arc<B>, ttl: Duration, width: usize) -> Self {
        Self {
            backend,
            ttl,
            width,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a cache using the TTL and width of an engine config.
    pub fn from_config(backend: Arc<B>, config: &AlternativesConfig) -> Self {
        Self::new(backend, config.cache_ttl, config.cache_width)
    }

    /// Get a reference to the cache backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Return the stored list for `key` if a live entry exists.
    ///
    /// Expired rows and backend errors both read as a miss. On a hit the
    /// row's hit counter is bumped by a detached task; the caller never
    /// waits for it and its failure is only logged.
    pub async fn check_cache(&self, key: &AlternativesCacheKey) -> Option<Vec<ScoredAlternative>> {
        let entry = match self.backend.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "alternatives cache read failed");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let now = Utc::now();
        match entry {
            Some(entry) if !entry.is_expired_at(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.spawn_hit_update(key.clone(), now);
                Some(entry.alternatives)
            }
            Some(_) => {
                debug!(key = %key, "alternatives cache entry expired");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store the top `width` alternatives for `key`, replacing any previous
    /// row and resetting its hit counter. Failures are logged and dropped.
    pub async fn save_to_cache(
        &self,
        key: &AlternativesCacheKey,
        mut alternatives: Vec<ScoredAlternative>,
    ) {
        alternatives.truncate(self.width);
        let now = Utc::now();
        let entry = CacheEntry::new(alternatives, now, expiry_after(now, self.ttl));

        if let Err(e) = self.backend.upsert(key, &entry).await {
            warn!(key = %key, error = %e, "alternatives cache write failed");
        }
    }

    /// Hit and miss counts of this facade plus the backend's row count.
    pub async fn stats(&self) -> KineticResult<CacheStats> {
        let backend_stats = self.backend.stats().await?;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: backend_stats.entry_count,
        })
    }

    /// Outside a Tokio runtime the update is skipped; the read still succeeds.
    fn spawn_hit_update(&self, key: AlternativesCacheKey, at: DateTime<Utc>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(key = %key, "no tokio runtime, skipping cache hit update");
            return;
        };
        let backend = Arc::clone(&self.backend);
        runtime.spawn(async move {
            if let Err(e) = backend.record_hit(&key, at).await {
                debug!(key = %key, error = %e, "cache hit update failed");
            }
        });
    }
}

impl<B: AlternativesCacheBackend + 'static> Clone for AlternativesCache<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            ttl: self.ttl,
            width: self.width,
            hits: Arc::clone(&self.hits),
            misses: Arc::clone(&self.misses),
        }
    }
}

impl<B: AlternativesCacheBackend + 'static> std::fmt::Debug for AlternativesCache<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlternativesCache")
            .field("ttl", &self.ttl)
            .field("width", &self.width)
            .finish()
    }
}

/// `now + ttl`, saturating at the latest representable instant.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
