use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Time-bounded memoization of scrape results.
///
/// Expiry is lazy: `get` treats an entry older than the TTL as absent without
/// deleting it, and a later `put` for the same key simply overwrites. There is
/// no background sweep; growth is bounded by the distinct key working set.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: String, value: V) {
        self.put_at(key, value, Instant::now());
    }

    pub fn put_at(&self, key: String, value: V, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let now = Instant::now();

        cache.put_at("milk:33130".to_string(), 399u32, now);

        assert_eq!(
            cache.get_at("milk:33130", now + Duration::from_secs(59)),
            Some(399)
        );
    }

    #[test]
    fn test_expired_entry_is_absent_but_not_deleted() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let now = Instant::now();

        cache.put_at("milk:33130".to_string(), 399u32, now);

        assert_eq!(cache.get_at("milk:33130", now + Duration::from_secs(60)), None);
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_put_overwrites_expired_entry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let now = Instant::now();

        cache.put_at("milk:33130".to_string(), 399u32, now);
        let later = now + Duration::from_secs(120);
        cache.put_at("milk:33130".to_string(), 429u32, later);

        assert_eq!(cache.get_at("milk:33130", later), Some(429));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("eggs:33130"), None);
    }
}
