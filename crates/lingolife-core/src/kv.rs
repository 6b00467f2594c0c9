//! In-memory key-value store for tests and ephemeral clients.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::traits::KeyValueStore;

/// A [`KeyValueStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_delete() {
        let kv = MemoryKvStore::new();
        assert!(kv.get("a").unwrap().is_none());

        kv.set("a", "1").unwrap();
        kv.set("a", "2").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(kv.len(), 1);

        kv.delete("a").unwrap();
        kv.delete("missing").unwrap();
        assert!(kv.is_empty());
    }
}
