use rowbind_cache::{CacheStore, InMemoryStore, NoCache, TtlCache};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

#[test]
fn test_cache_hit() {
    let cache = TtlCache::new(Duration::from_secs(60));
    cache.insert("key", "value");
    assert_eq!(cache.get(&"key"), Some("value"));
}

#[test]
fn test_cache_expiry() {
    let cache = TtlCache::new(Duration::from_millis(50));
    cache.insert("key", "value");
    assert_eq!(cache.get(&"key"), Some("value"));
    sleep(Duration::from_millis(60));
    assert_eq!(cache.get(&"key"), None);
}

#[test]
fn test_unbounded_cache_keeps_entries() {
    let cache = TtlCache::unbounded();
    cache.insert("key", 1);
    cache.evict_expired();
    assert_eq!(cache.get(&"key"), Some(1));
}

#[test]
fn test_in_memory_store_read_write() {
    let store = InMemoryStore::new();
    assert_eq!(store.read("users"), None);
    store.write("users", Arc::new(vec!["id", "name"]));
    assert_eq!(store.read("users").map(|v| v.len()), Some(2));

    store.remove("users");
    assert_eq!(store.read("users"), None);
}

#[test]
fn test_in_memory_store_prefix_removal() {
    let store = InMemoryStore::new();
    store.write("table_schema:users", 1);
    store.write("table_schema:posts", 2);
    store.write("other:users", 3);

    store.remove_by_prefix("table_schema:");
    assert_eq!(store.read("table_schema:users"), None);
    assert_eq!(store.read("table_schema:posts"), None);
    assert_eq!(store.read("other:users"), Some(3));
}

#[test]
fn test_in_memory_store_ttl() {
    let store = InMemoryStore::with_ttl(Duration::from_millis(30));
    store.write("k", "v");
    sleep(Duration::from_millis(40));
    assert_eq!(store.read("k"), None);
}

#[test]
fn test_no_cache_always_misses() {
    let store: Arc<dyn CacheStore<u32>> = Arc::new(NoCache);
    store.write("k", 1);
    assert_eq!(store.read("k"), None);
}
