use std::collections::HashMap;

use parking_lot::Mutex;

use crate::StoreError;

/// Keyed transient state (sessions by token, OTP challenges by user).
///
/// Each call is atomic with respect to every other call on the same key.
/// [`StateStore::update`] is the read-modify-write primitive: the closure
/// sees the current slot and may change or clear it, and no other writer
/// interleaves. A shared-cache backend implements it with a CAS loop or a
/// server-side script.
///
/// Implementations must be safe for concurrent use.
pub trait StateStore<V>: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<V>, StoreError>;

    /// Insert or overwrite.
    fn put(&self, key: &str, value: V) -> Result<(), StoreError>;

    /// Remove and return the entry, if any.
    fn remove(&self, key: &str) -> Result<Option<V>, StoreError>;

    /// Atomically apply `f` to the slot for `key`. Leaving the slot `None`
    /// removes the entry.
    fn update(&self, key: &str, f: &mut dyn FnMut(&mut Option<V>)) -> Result<(), StoreError>;

    /// Drop every entry for which `keep` returns false. Returns how many
    /// were dropped.
    fn retain(&self, keep: &mut dyn FnMut(&str, &V) -> bool) -> Result<usize, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;
}

/// In-process [`StateStore`]. Data is lost on restart, which forces
/// users to authenticate again.
pub struct MemoryStateStore<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V> MemoryStateStore<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> Default for MemoryStateStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> StateStore<V> for MemoryStateStore<V> {
    fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: V) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<V>, StoreError> {
        Ok(self.entries.lock().remove(key))
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(&mut Option<V>)) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let mut slot = entries.remove(key);
        f(&mut slot);
        if let Some(value) = slot {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn retain(&self, keep: &mut dyn FnMut(&str, &V) -> bool) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|k, v| keep(k, v));
        Ok(before - entries.len())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn put_get_remove() {
        let store = MemoryStateStore::new();
        store.put("a", 1u32).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(1));
        assert_eq!(store.remove("a").unwrap(), Some(1));
        assert_eq!(store.remove("a").unwrap(), None);
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn update_can_insert_modify_and_clear() {
        let store = MemoryStateStore::new();
        store
            .update("a", &mut |slot: &mut Option<u32>| *slot = Some(1))
            .unwrap();
        store
            .update("a", &mut |slot: &mut Option<u32>| {
                if let Some(v) = slot.as_mut() {
                    *v += 1;
                }
            })
            .unwrap();
        assert_eq!(store.get("a").unwrap(), Some(2));

        store
            .update("a", &mut |slot: &mut Option<u32>| *slot = None)
            .unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn retain_counts_removed() {
        let store = MemoryStateStore::new();
        for i in 0..10u32 {
            store.put(&format!("k{i}"), i).unwrap();
        }
        let removed = store.retain(&mut |_, v| v % 2 == 0).unwrap();
        assert_eq!(removed, 5);
        assert_eq!(store.len().unwrap(), 5);
    }

    #[test]
    fn concurrent_updates_do_not_lose_writes() {
        let store = Arc::new(MemoryStateStore::new());
        store.put("counter", 0u64).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        store
                            .update("counter", &mut |slot: &mut Option<u64>| {
                                if let Some(v) = slot.as_mut() {
                                    *v += 1;
                                }
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.get("counter").unwrap(), Some(8000));
    }
}
