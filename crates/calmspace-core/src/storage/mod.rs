mod config;
pub mod database;
pub mod memory;

pub use config::{ClockConfig, Config, NotificationsConfig, RewardsConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Result, StorageError};

/// Durable string key-value storage used by the rewards ledger.
///
/// `get` returns `Ok(None)` for keys that were never set. Implementations
/// must make `set_many` all-or-nothing when they can; the default falls
/// back to sequential writes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Run a read-modify-write against the store as one unit.
    ///
    /// `f` sees every write made by other updates either entirely or not at
    /// all, and its own writes are discarded if it returns an error (for
    /// stores that can roll back). Stores shared between processes must hold
    /// their cross-process lock for the whole call.
    fn update(&self, f: &mut dyn FnMut(&dyn KeyValueStore) -> Result<()>) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        (**self).set_many(entries)
    }

    fn update(&self, f: &mut dyn FnMut(&dyn KeyValueStore) -> Result<()>) -> Result<()> {
        (**self).update(f)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        (**self).set_many(entries)
    }

    fn update(&self, f: &mut dyn FnMut(&dyn KeyValueStore) -> Result<()>) -> Result<()> {
        (**self).update(f)
    }
}

/// Returns the calmspace data directory.
///
/// `CALMSPACE_DATA_DIR` wins when set. Otherwise `~/.config/calmspace[-dev]/`
/// based on CALMSPACE_ENV (set CALMSPACE_ENV=dev for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("CALMSPACE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("CALMSPACE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("calmspace-dev")
            } else {
                base_dir.join("calmspace")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
