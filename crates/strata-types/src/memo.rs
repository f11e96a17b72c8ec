use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// A concurrent compute-once map.
///
/// Concurrent callers racing on the same unseen key may each invoke the
/// factory, but only one produced value is ever published: the first insert
/// wins and every caller receives the published value. Entries are never
/// removed. Failed factories publish nothing, so a later call may retry.
pub struct MemoCache<K, V> {
    map: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a previously published value.
    pub fn get(&self, key: &K) -> Option<V> {
        self.map.read().expect("cache lock poisoned").get(key).cloned()
    }

    /// Return the published value for `key`, computing it if absent.
    ///
    /// The factory runs outside the lock, so it may run more than once
    /// under contention; the losing results are discarded.
    pub fn get_or_insert_with(&self, key: &K, factory: impl FnOnce() -> V) -> V {
        if let Some(existing) = self.get(key) {
            return existing;
        }
        let candidate = factory();
        let mut map = self.map.write().expect("cache lock poisoned");
        map.entry(key.clone()).or_insert(candidate).clone()
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// A factory error is returned to the caller and nothing is published.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        factory: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }
        let candidate = factory()?;
        let mut map = self.map.write().expect("cache lock poisoned");
        Ok(map.entry(key.clone()).or_insert(candidate).clone())
    }

    pub fn len(&self) -> usize {
        self.map.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.map.read().expect("cache lock poisoned").len();
        f.debug_struct("MemoCache").field("entries", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn computes_on_first_access() {
        let cache: MemoCache<String, u32> = MemoCache::new();
        let v = cache.get_or_insert_with(&"a".to_string(), || 41 + 1);
        assert_eq!(v, 42);
        assert_eq!(cache.get(&"a".to_string()), Some(42));
    }

    #[test]
    fn second_access_skips_factory() {
        let cache: MemoCache<&'static str, u32> = MemoCache::new();
        cache.get_or_insert_with(&"k", || 1);
        let v = cache.get_or_insert_with(&"k", || panic!("factory must not run"));
        assert_eq!(v, 1);
    }

    #[test]
    fn failed_factory_publishes_nothing() {
        let cache: MemoCache<&'static str, u32> = MemoCache::new();
        let err: Result<u32, &str> = cache.get_or_try_insert_with(&"k", || Err("boom"));
        assert_eq!(err, Err("boom"));
        assert!(cache.get(&"k").is_none());

        // A later call may succeed and publish.
        let ok: Result<u32, &str> = cache.get_or_try_insert_with(&"k", || Ok(9));
        assert_eq!(ok, Ok(9));
    }

    #[test]
    fn concurrent_callers_receive_one_published_value() {
        let cache: Arc<MemoCache<u32, Arc<u32>>> = Arc::new(MemoCache::new());
        let factory_runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let runs = Arc::clone(&factory_runs);
                thread::spawn(move || {
                    cache.get_or_insert_with(&7, || {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Arc::new(99)
                    })
                })
            })
            .collect();

        let values: Vec<Arc<u32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Duplicate factory runs are allowed; duplicate published values are not.
        let first = &values[0];
        for v in &values {
            assert!(Arc::ptr_eq(first, v));
        }
        assert_eq!(cache.len(), 1);
        assert!(factory_runs.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn len_and_is_empty() {
        let cache: MemoCache<u32, u32> = MemoCache::new();
        assert!(cache.is_empty());
        cache.get_or_insert_with(&1, || 1);
        cache.get_or_insert_with(&2, || 2);
        assert_eq!(cache.len(), 2);
    }
}
