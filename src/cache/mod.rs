//! Keyed client cache
//!
//! Clients are stored behind `Arc` so every caller of a key shares one instance.
//! Entries live until the cache is dropped; there is no eviction.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct ClientCache<C> {
    clients: Mutex<HashMap<String, Arc<C>>>,
}

impl<C> Default for ClientCache<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ClientCache<C> {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<C>> {
        self.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Return the cached client for `key`, or create, store and return it.
    ///
    /// The lock is held while `create` runs, so concurrent callers for the same key
    /// never build two clients. A failed `create` leaves the cache untouched.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        create: impl FnOnce() -> Result<C, E>,
    ) -> Result<Arc<C>, E> {
        let mut clients = self.lock();
        if let Some(client) = clients.get(key) {
            return Ok(client.clone());
        }

        let client = Arc::new(create()?);
        clients.insert(key.to_string(), client.clone());
        Ok(client)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<C>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> fmt::Debug for ClientCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.keys();
        keys.sort_unstable();
        f.debug_struct("ClientCache")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_then_hit() {
        let cache = ClientCache::new();
        let first = cache
            .get_or_try_insert_with("default", || Ok::<_, ()>(String::from("client")))
            .unwrap();
        let second = cache
            .get_or_try_insert_with("default", || -> Result<String, ()> {
                panic!("cached entry must be reused")
            })
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("default"));
    }

    #[test]
    fn test_failed_create_not_cached() {
        let cache: ClientCache<String> = ClientCache::new();
        let result = cache.get_or_try_insert_with("default", || Err("boom"));

        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.is_empty());
        assert!(cache.get("default").is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = ClientCache::new();
        let a = cache.get_or_try_insert_with("a", || Ok::<_, ()>(1)).unwrap();
        let b = cache.get_or_try_insert_with("b", || Ok::<_, ()>(1)).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        let mut keys = cache.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_debug_lists_keys_only() {
        let cache = ClientCache::new();
        cache
            .get_or_try_insert_with("uploads", || Ok::<_, ()>(String::from("token-abc")))
            .unwrap();
        cache
            .get_or_try_insert_with("default", || Ok::<_, ()>(String::from("token-xyz")))
            .unwrap();

        let debug = format!("{cache:?}");
        assert_eq!(debug, r#"ClientCache { keys: ["default", "uploads"], .. }"#);
    }
}
