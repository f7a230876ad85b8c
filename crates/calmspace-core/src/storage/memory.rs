//! In-process key-value store.
//!
//! Used by tests and by embedders that persist elsewhere. `set_many` applies
//! every entry under a single lock, so readers never see a half-written batch.
//! `update` calls are serialized by a second lock; they do not roll back.

use std::collections::HashMap;
use std::sync::Mutex;

use super::KeyValueStore;
use crate::error::{Result, StorageError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    // Held for a whole `update`; `entries` is only held per operation.
    update_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::read(key, format!("Lock failed: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::write(key, format!("Lock failed: {e}")))?;
        entries.remove(key);
        Ok(())
    }

    fn set_many(&self, batch: &[(&str, &str)]) -> Result<(), StorageError> {
        let first_key = batch.first().map(|(k, _)| *k).unwrap_or_default();
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::write(first_key, format!("Lock failed: {e}")))?;
        for (key, value) in batch {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn update(&self, f: &mut dyn FnMut(&dyn KeyValueStore) -> Result<()>) -> Result<()> {
        let _guard = self
            .update_lock
            .lock()
            .map_err(|e| StorageError::write("update", format!("Lock failed: {e}")))?;
        f(self)
    }
}
