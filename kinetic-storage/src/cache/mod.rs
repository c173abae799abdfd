//! Alternatives cache with tenant-scoped keys.
//!
//! A cache row holds the ranked alternatives computed for one source
//! exercise, one equipment set and one difficulty filter. Rows expire after
//! a fixed TTL and are never deleted by the engine: an expired row reads as
//! a miss and is overwritten by the next save.
//!
//! # Tenant Isolation
//!
//! [`AlternativesCacheKey`] cannot be constructed without a `tenant_id`, so
//! one tenant's rows are never visible to another.
//!
//! # Backends
//!
//! - [`InMemoryCacheBackend`]: process-local map, used by tests and
//!   single-node deployments.
//! - [`LmdbCacheBackend`]: persistent memory-mapped store.

pub mod key;
pub mod lmdb_backend;
pub mod memory;
pub mod store;
pub mod traits;

pub use key::{AlternativesCacheKey, ENCODED_KEY_LEN};
pub use lmdb_backend::{LmdbCacheBackend, LmdbCacheError};
pub use memory::InMemoryCacheBackend;
pub use store::AlternativesCache;
pub use traits::{AlternativesCacheBackend, CacheEntry, CacheStats};
