//! Small bounded in-memory cache with per-entry expiry.

use std::{
  collections::HashMap,
  hash::Hash,
  time::{Duration, Instant},
};

use tokio::sync::Mutex;

pub struct TtlCache<K, V> {
  ttl: Duration,
  max_entries: usize,
  entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
  pub fn new(ttl: Duration, max_entries: usize) -> Self {
    Self { ttl, max_entries: max_entries.max(1), entries: Mutex::new(HashMap::new()) }
  }

  pub async fn get(&self, key: &K) -> Option<V> {
    let mut entries = self.entries.lock().await;
    match entries.get(key) {
      Some((at, v)) if at.elapsed() < self.ttl => Some(v.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  /// Insert, dropping expired entries first and then the oldest one if still full.
  pub async fn insert(&self, key: K, value: V) {
    let mut entries = self.entries.lock().await;
    if !entries.contains_key(&key) && entries.len() >= self.max_entries {
      let ttl = self.ttl;
      entries.retain(|_, (at, _)| at.elapsed() < ttl);
      if entries.len() >= self.max_entries {
        let oldest = entries.iter().min_by_key(|(_, (at, _))| *at).map(|(k, _)| k.clone());
        if let Some(k) = oldest {
          entries.remove(&k);
        }
      }
    }
    entries.insert(key, (Instant::now(), value));
  }

  #[cfg(test)]
  pub async fn len(&self) -> usize {
    self.entries.lock().await.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn hit_within_ttl() {
    let c = TtlCache::new(Duration::from_secs(60), 4);
    c.insert("a", 1).await;
    assert_eq!(c.get(&"a").await, Some(1));
    assert_eq!(c.get(&"b").await, None);
  }

  #[tokio::test]
  async fn expired_entries_are_dropped() {
    let c = TtlCache::new(Duration::ZERO, 4);
    c.insert("a", 1).await;
    assert_eq!(c.get(&"a").await, None);
    assert_eq!(c.len().await, 0);
  }

  #[tokio::test]
  async fn full_cache_evicts_oldest() {
    let c = TtlCache::new(Duration::from_secs(60), 2);
    c.insert("a", 1).await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    c.insert("b", 2).await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    c.insert("c", 3).await;
    assert_eq!(c.len().await, 2);
    assert_eq!(c.get(&"a").await, None);
    assert_eq!(c.get(&"b").await, Some(2));
    assert_eq!(c.get(&"c").await, Some(3));
  }

  #[tokio::test]
  async fn overwrite_does_not_evict() {
    let c = TtlCache::new(Duration::from_secs(60), 2);
    c.insert("a", 1).await;
    c.insert("b", 2).await;
    c.insert("a", 10).await;
    assert_eq!(c.get(&"a").await, Some(10));
    assert_eq!(c.get(&"b").await, Some(2));
  }
}
