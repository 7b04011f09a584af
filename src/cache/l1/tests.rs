use super::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn cache_with_memory_store() -> (L1ExactCache, Arc<MemoryExactStore>) {
    let store = Arc::new(MemoryExactStore::new());
    let cache = L1ExactCache::new(Some(store.clone()), Duration::from_secs(60));
    (cache, store)
}

#[tokio::test]
async fn miss_then_hit_roundtrip() {
    let (cache, _) = cache_with_memory_store();
    let key = "/v1/search/vector:opensearch:abc";

    assert!(cache.lookup(key).await.is_none());

    let value = json!({"results": [1, 2, 3]});
    cache.store(key, &value).await;

    assert_eq!(cache.lookup(key).await, Some(value));
}

#[tokio::test]
async fn expired_entries_read_as_miss() {
    let store = Arc::new(MemoryExactStore::new());
    let cache = L1ExactCache::new(Some(store.clone()), Duration::from_millis(20));
    let key = "k";

    cache.store(key, &json!({"ok": true})).await;
    assert!(cache.lookup(key).await.is_some());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(cache.lookup(key).await.is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn disabled_cache_always_misses() {
    let cache = L1ExactCache::new(None, Duration::from_secs(60));
    assert!(!cache.enabled());

    cache.store("k", &json!({"ok": true})).await;
    assert!(cache.lookup("k").await.is_none());
}

#[tokio::test]
async fn failing_store_degrades_to_miss() {
    let cache = L1ExactCache::new(
        Some(Arc::new(FailingExactStore)),
        Duration::from_secs(60),
    );

    // Neither operation may error out of the facade.
    cache.store("k", &json!({"ok": true})).await;
    assert!(cache.lookup("k").await.is_none());
}

#[tokio::test]
async fn undecodable_entry_reads_as_miss() {
    let (cache, store) = cache_with_memory_store();
    store
        .set("k", b"not json", Duration::from_secs(60))
        .await
        .expect("raw write");

    assert!(cache.lookup("k").await.is_none());
}

#[tokio::test]
async fn keys_are_independent() {
    let (cache, _) = cache_with_memory_store();
    cache.store("a", &json!(1)).await;
    cache.store("b", &json!(2)).await;

    assert_eq!(cache.lookup("a").await, Some(json!(1)));
    assert_eq!(cache.lookup("b").await, Some(json!(2)));
    assert!(cache.lookup("c").await.is_none());
}
