//! In-memory TTL cache for upstream lookup results.
//!
//! Caches both positive and negative (404) results so repeated checks for
//! the same key within the TTL never touch the network. The cache lives for
//! the process, not just a single run.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A thread-safe map with per-entry expiry.
pub struct TtlCache<V: Clone> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a cached value if present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Store a value, replacing any previous entry for the key.
    pub fn set(&self, key: &str, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let cache: TtlCache<Option<u32>> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("npm:react"), None);

        cache.set("npm:react", Some(18));
        assert_eq!(cache.get("npm:react"), Some(Some(18)));

        // Negative results are cached values too, distinct from a miss.
        cache.set("npm:phantom", None);
        assert_eq!(cache.get("npm:phantom"), Some(None));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_expiry() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::ZERO);
        cache.set("k", 1);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_replacement() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
    }
}
