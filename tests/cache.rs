//! Tiered cache tests against a counting artifact source

mod helper;

use std::sync::Arc;

use tempfile::TempDir;

use helper::{CountingSource, TextLoader};
use version_floor::engine::cache::{EngineCache, TieredCache};
use version_floor::engine::error::CacheError;

fn tiered(dir: &TempDir, source: &Arc<CountingSource>) -> TieredCache<TextLoader> {
    TieredCache::new(dir.path(), "typescript", source.clone(), TextLoader)
}

#[tokio::test]
async fn load_free_load_fetches_once() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CountingSource::new());
    let cache = tiered(&dir, &source);

    let first = cache.load("5.0.0").await.unwrap();
    cache.free("5.0.0");
    let second = cache.load("5.0.0").await.unwrap();

    assert_eq!(source.fetches(), 1);
    assert_eq!(first, second);
    assert_eq!(second.as_str(), "engine 5.0.0");
}

#[tokio::test]
async fn disk_tier_survives_a_new_cache_instance() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CountingSource::new());

    tiered(&dir, &source).load("4.9.5").await.unwrap();
    let engine = tiered(&dir, &source).load("4.9.5").await.unwrap();

    assert_eq!(source.fetches(), 1);
    assert_eq!(engine.as_str(), "engine 4.9.5");
}

#[tokio::test]
async fn purge_then_load_fetches_exactly_once_more() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CountingSource::new());
    let cache = tiered(&dir, &source);

    cache.load("5.0.0").await.unwrap();
    cache.purge().await.unwrap();
    cache.load("5.0.0").await.unwrap();
    cache.free("5.0.0");
    cache.load("5.0.0").await.unwrap();

    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn purge_on_never_created_root_succeeds() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CountingSource::new());
    let cache = tiered(&dir, &source);

    cache.purge().await.unwrap();

    assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn fetch_failure_surfaces_and_is_retried_next_time() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CountingSource::new().with_missing("0.0.0"));
    let cache = tiered(&dir, &source);

    assert!(matches!(
        cache.load("0.0.0").await,
        Err(CacheError::Fetch { .. })
    ));
    assert!(matches!(
        cache.load("0.0.0").await,
        Err(CacheError::Fetch { .. })
    ));
    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn one_artifact_per_version() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(CountingSource::new());
    let cache = tiered(&dir, &source);

    for _ in 0..3 {
        cache.load("5.1.0-rc.20240101").await.unwrap();
        cache.free("5.1.0-rc.20240101");
    }
    cache.load("5.0.0").await.unwrap();

    let files = std::fs::read_dir(cache.path().unwrap()).unwrap().count();
    assert_eq!(files, 2);
    assert_eq!(source.fetches(), 2);
}
