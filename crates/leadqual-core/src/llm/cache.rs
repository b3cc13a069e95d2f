//! In-memory TTL cache for LLM service responses

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CAPACITY: usize = 4096;

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Bounded cache whose entries expire after a fixed TTL
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create cache with default TTL of 1 hour
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Limit the number of live entries
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Get cached value if exists and not expired
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        (Instant::now() < entry.expires_at).then(|| entry.value.clone())
    }

    /// Store a value, evicting expired entries first when the cache is full
    pub fn insert(&self, key: String, value: V) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        if entries.len() >= self.capacity {
            let now = Instant::now();
            entries.retain(|_, entry| now < entry.expires_at);
        }
        if entries.len() >= self.capacity {
            // Still full of live entries: drop the one closest to expiry
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Clear all entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let Ok(entries) = self.entries.read() else {
            return CacheStats::default();
        };
        let now = Instant::now();
        let expired = entries.values().filter(|e| now >= e.expires_at).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            active_entries: entries.len() - expired,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Generate cache key for embeddings
pub fn embedding_cache_key(model: &str, text: &str) -> String {
    use std::collections::hash_map::DefaultHasher;

    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    text.hash(&mut hasher);
    format!("embed:{}:{:x}", model, hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache: TtlCache<Vec<f32>> = TtlCache::new();
        cache.insert("a".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("a"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_expiry() {
        let cache: TtlCache<String> = TtlCache::with_ttl(Duration::from_millis(50));
        cache.insert("k".to_string(), "v".to_string());
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().expired_entries, 1);
    }

    #[test]
    fn test_capacity_bound() {
        let cache: TtlCache<u32> = TtlCache::new().with_capacity(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);
        assert_eq!(cache.stats().total_entries, 2);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_key_depends_on_model_and_text() {
        let k1 = embedding_cache_key("nomic", "acme");
        assert_eq!(k1, embedding_cache_key("nomic", "acme"));
        assert_ne!(k1, embedding_cache_key("nomic", "globex"));
        assert_ne!(k1, embedding_cache_key("minilm", "acme"));
    }
}
