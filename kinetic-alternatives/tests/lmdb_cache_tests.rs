//! The pipeline over the persistent cache backend.

use std::sync::Arc;

use kinetic_alternatives::AlternativesEngine;
use kinetic_storage::LmdbCacheBackend;
use kinetic_test_utils::fixtures::{self, FULL_GYM};
use kinetic_test_utils::{init_test_tracing, AlternativesConfig, AlternativesRequest};
use tempfile::TempDir;
use uuid::Uuid;

#[tokio::test]
async fn cached_list_survives_reopen() {
    init_test_tracing();
    let dir = TempDir::new().unwrap();
    let (source, catalog) = fixtures::squat_catalog();
    let catalog = Arc::new(catalog);
    let tenant = Uuid::now_v7();
    let request = AlternativesRequest::new(source.id, tenant).with_equipment(FULL_GYM);

    let first_ids = {
        let backend = Arc::new(LmdbCacheBackend::new(dir.path(), 10).unwrap());
        let engine =
            AlternativesEngine::new(Arc::clone(&catalog), backend, AlternativesConfig::default())
                .unwrap();
        let first = engine.get_alternatives(&request).await.unwrap();
        assert!(!first.was_cached);
        first.ids()
    };

    let backend = Arc::new(LmdbCacheBackend::new(dir.path(), 10).unwrap());
    let engine = AlternativesEngine::new(
        Arc::clone(&catalog),
        Arc::clone(&backend),
        AlternativesConfig::default(),
    )
    .unwrap();

    let second = engine.get_alternatives(&request).await.unwrap();
    assert!(second.was_cached);
    assert_eq!(second.ids(), first_ids);

    assert_eq!(backend.invalidate_exercise(tenant, source.id).unwrap(), 1);
    let recomputed = engine.get_alternatives(&request).await.unwrap();
    assert!(!recomputed.was_cached);
    assert_eq!(recomputed.ids(), first_ids);
}
