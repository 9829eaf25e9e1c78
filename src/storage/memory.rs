use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::KeyValueStore;
use crate::error::{ChronicleError, Result};

/// In-process storage. Clones share the same map, so a handle kept outside
/// the store sees every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that refuses writes once keys plus values would exceed `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Rc::default(),
            quota: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let others: usize = self
                .entries
                .borrow()
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(ChronicleError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_overwrite() {
        let mut storage = MemoryStorage::new();
        assert!(storage.is_empty());
        storage.set("a", "1").unwrap();

        assert_eq!(storage.get("a"), Some("1".to_string()));
        assert_eq!(storage.len(), 1);

        storage.set("a", "2").unwrap();
        assert_eq!(storage.get("a"), Some("2".to_string()));
        assert_eq!(storage.len(), 1);
        assert!(storage.get("b").is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let mut storage = MemoryStorage::new();
        let observer = storage.clone();

        storage.set("chronicle_beats", "[]").unwrap();
        assert_eq!(observer.get("chronicle_beats"), Some("[]".to_string()));
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set("k", "12345").unwrap();

        let result = storage.set("other", "123456");
        assert!(matches!(result, Err(ChronicleError::QuotaExceeded { .. })));
        assert!(storage.get("other").is_none());

        // Overwriting an existing key only counts the new value
        storage.set("k", "123456789").unwrap();
    }

    #[test]
    fn test_size_in_bytes() {
        let mut storage = MemoryStorage::new();
        storage.set("ab", "cde").unwrap();
        assert_eq!(storage.size_in_bytes(), 5);
    }
}
