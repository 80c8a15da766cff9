use super::KeyValueStore;
use crate::error::StoreError;
use ahash::AHashMap;

/// Volatile store, optionally bounded by a total byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: AHashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the summed size of all stored values.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn used_bytes(&self) -> usize {
        self.slots.values().map(String::len).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            let replaced = self.slots.get(key).map_or(0, String::len);
            let requested = self.used_bytes() - replaced + value.len();
            if requested > limit {
                return Err(StoreError::QuotaExceeded { requested, limit });
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.slots.remove(key);
        Ok(())
    }
}
