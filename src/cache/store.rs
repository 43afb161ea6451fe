//! Keyed store of resources with single-flight fetch semantics.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::resource::Resource;

/// Map of cache key to the resource created by the first fetch request.
///
/// One logical data set (e.g. "tasks") maps to one entry. The map is only
/// mutated synchronously under its lock, never across an await point, so
/// two callers racing on the same key still observe exactly one fetch.
///
/// Cloning a cache shares the underlying map, so a fetch closure can hold
/// a handle back to its owning cache to invalidate itself on failure.
pub struct ResourceCache<T: Clone> {
  entries: Arc<Mutex<HashMap<String, Resource<T>>>>,
}

impl<T: Clone> Clone for ResourceCache<T> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
    }
  }
}

impl<T: Clone> Default for ResourceCache<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Clone> ResourceCache<T> {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
    }
  }
}

impl<T: Clone + Send + Sync + 'static> ResourceCache<T> {
  /// Return the resource stored under `key`, or invoke `fetch` once and
  /// store the result.
  ///
  /// When `key` is already present the closure is ignored entirely, so
  /// between invalidations the fetch runs at most once per key no matter
  /// how many callers ask. The fetch is spawned onto the runtime and runs
  /// to completion even if every reader loses interest.
  pub fn get_or_create<F, Fut>(&self, key: &str, fetch: F) -> Resource<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = crate::error::Result<T>> + Send + 'static,
  {
    let mut entries = self.entries.lock().expect("cache lock poisoned");

    if let Some(resource) = entries.get(key) {
      return resource.clone();
    }

    debug!(key, "starting fetch for cache miss");
    let resource = Resource::new(fetch());

    let driver = resource.clone();
    tokio::spawn(async move {
      let _ = driver.ready().await;
    });

    entries.insert(key.to_string(), resource.clone());
    resource
  }

  /// Remove the entry for `key`; the next request re-fetches.
  /// Removing an absent key is a no-op.
  pub fn invalidate(&self, key: &str) {
    let mut entries = self.entries.lock().expect("cache lock poisoned");
    if entries.remove(key).is_some() {
      debug!(key, "cache entry invalidated");
    }
  }

  /// Whether `key` currently has an entry (pending or settled).
  pub fn contains(&self, key: &str) -> bool {
    self
      .entries
      .lock()
      .expect("cache lock poisoned")
      .contains_key(key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  fn counting_fetch(counter: &Arc<AtomicUsize>) -> impl Future<Output = crate::error::Result<u32>> {
    let counter = Arc::clone(counter);
    async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(42)
    }
  }

  #[tokio::test]
  async fn test_second_request_reuses_stored_resource() {
    let cache = ResourceCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = cache.get_or_create("tasks", || counting_fetch(&calls));
    let second = cache.get_or_create("tasks", || counting_fetch(&calls));

    first.ready().await.unwrap();
    second.ready().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_concurrent_requests_share_one_fetch() {
    let cache = ResourceCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let resources: Vec<_> = (0..8)
      .map(|_| {
        let calls = Arc::clone(&calls);
        cache.get_or_create("tasks", move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          tokio::time::sleep(Duration::from_millis(20)).await;
          Ok(1)
        })
      })
      .collect();

    for resource in resources {
      assert_eq!(resource.ready().await.unwrap(), 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidate_forces_refetch() {
    let cache = ResourceCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .get_or_create("tasks", || counting_fetch(&calls))
      .ready()
      .await
      .unwrap();
    cache.invalidate("tasks");
    cache
      .get_or_create("tasks", || counting_fetch(&calls))
      .ready()
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidate_unknown_key_is_noop() {
    let cache: ResourceCache<u32> = ResourceCache::new();
    cache.invalidate("never-created");
    assert!(!cache.contains("never-created"));
  }

  #[tokio::test]
  async fn test_distinct_keys_fetch_independently() {
    let cache = ResourceCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .get_or_create("tasks", || counting_fetch(&calls))
      .ready()
      .await
      .unwrap();
    cache
      .get_or_create("lists", || counting_fetch(&calls))
      .ready()
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.contains("tasks"));
    assert!(cache.contains("lists"));
  }

  #[tokio::test]
  async fn test_fetch_runs_to_completion_without_readers() {
    let cache = ResourceCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    {
      let calls = Arc::clone(&calls);
      // Resource handle dropped immediately; the spawned driver still
      // polls the fetch to completion.
      let _ = cache.get_or_create("tasks", move || async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
      });
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The settled resource is still served from the cache.
    let resource = cache.get_or_create("tasks", || async { unreachable!() });
    assert!(resource.read().is_ready());
  }
}
