use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Generic per-process TTL cache keyed by string.
///
/// Concurrency model: a single mutex guards the map. Lock-held work is one
/// hash lookup plus one `Instant` comparison — short enough that
/// contention never becomes a bottleneck. Expired entries are evicted
/// lazily, on `get` and `len`; two callers racing to evict the same stale
/// entry is safe and expected, not a bug. Only successful values are ever
/// stored — `set` is never called with a failure.
pub struct Cache<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> Cache<T> {
    pub fn new() -> Self {
        Cache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!(key, "cache entry expired, evicting");
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: String, value: T, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.lock().unwrap().insert(key, Entry { value, expires_at });
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of live entries. Also evicts anything expired as a side
    /// effect, matching the "evicted lazily on read and on `len`" contract.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit cached-lookup helper: checks the cache, and on a miss calls
/// `thunk` to compute the value, storing it only if `thunk` succeeds.
///
/// This replaces a reflection-over-argument-names decorator with a plain
/// function: the caller supplies the key and the fallible async thunk, no
/// magic derivation of either from call-site arguments.
pub async fn cached<T, E, F, Fut>(
    cache: &Cache<T>,
    key: &str,
    ttl: Duration,
    thunk: F,
) -> Result<T, E>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(value) = cache.get(key) {
        return Ok(value);
    }

    let value = thunk().await?;
    cache.set(key.to_string(), value.clone(), ttl);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn set_then_get_returns_value() {
        let cache: Cache<String> = Cache::new();
        cache.set("k".to_string(), "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache: Cache<String> = Cache::new();
        cache.set("k".to_string(), "v".to_string(), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_and_clear() {
        let cache: Cache<i32> = Cache::new();
        cache.set("a".to_string(), 1, Duration::from_secs(60));
        cache.set("b".to_string(), 2, Duration::from_secs(60));
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn cached_helper_calls_thunk_once_per_ttl() {
        let cache: Cache<u32> = Cache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result: Result<u32, DomainSaleTestError> =
                cached(&cache, "x", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(result.unwrap(), 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Debug)]
    struct DomainSaleTestError;
}
