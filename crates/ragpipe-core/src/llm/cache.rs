//! In-memory response cache for gateway calls

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CAPACITY: usize = 10_000;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// TTL cache keyed by content hash, bounded in size
pub struct ResponseCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Get cached value if present and not expired
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        (Instant::now() < entry.expires_at).then(|| entry.value.clone())
    }

    /// Insert a value, evicting expired entries first when full
    pub fn insert(&self, key: String, value: V) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        let now = Instant::now();
        if entries.len() >= self.capacity {
            entries.retain(|_, e| now < e.expires_at);
        }
        if entries.len() >= self.capacity {
            // Still full: drop the entry closest to expiry.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key for one (kind, model, payload) triple
pub fn cache_key(kind: &str, model: &str, payload: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(&[0]);
    hasher.update(payload.as_bytes());
    format!("{}:{}:{}", kind, model, hasher.finalize().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic() {
        let cache: ResponseCache<String> = ResponseCache::new();
        cache.insert("key1".to_string(), "value1".to_string());
        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.get("key2"), None);
    }

    #[test]
    fn test_cache_expiry() {
        let cache: ResponseCache<Vec<f32>> =
            ResponseCache::with_limits(Duration::from_millis(50), 10);
        cache.insert("v".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("v"), Some(vec![1.0, 2.0]));

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get("v"), None);
    }

    #[test]
    fn test_cache_capacity_bound() {
        let cache: ResponseCache<u32> = ResponseCache::with_limits(Duration::from_secs(60), 2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_cache_key_generation() {
        let key1 = cache_key("embed", "model1", "text1");
        let key2 = cache_key("embed", "model1", "text1");
        let key3 = cache_key("embed", "model1", "text2");
        let key4 = cache_key("chat", "model1", "text1");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_ne!(key1, key4);
    }
}
