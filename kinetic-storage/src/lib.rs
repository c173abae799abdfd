//! KINETIC Storage - Catalog Access and Alternatives Cache
//!
//! Defines the read interface to the exercise catalog and the persistent
//! cache of ranked alternatives lists.

pub mod cache;
pub mod catalog;

pub use cache::{
    AlternativesCache, AlternativesCacheBackend, AlternativesCacheKey, CacheEntry, CacheStats,
    InMemoryCacheBackend, LmdbCacheBackend, LmdbCacheError,
};
pub use catalog::{matches_query, ExerciseCatalog, InMemoryExerciseCatalog};
