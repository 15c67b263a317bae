//! Synchronous key-value port used for offline mode and for remembering the
//! player's id between sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use sheep_store::{LocalStorage, StoreError};

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// [`LocalStore`] persisted with `sheep-store`'s [`LocalStorage`].
pub struct SqliteLocalStore {
    inner: Mutex<LocalStorage>,
}

impl SqliteLocalStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { inner: Mutex::new(storage) }
    }

    fn with<T>(&self, f: impl FnOnce(&LocalStorage) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| StoreError::Io(std::io::Error::other(format!("Lock poisoned: {e}"))))?;
        f(&guard)
    }
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with(|s| s.get(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with(|s| s.set(key, value))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.with(|s| s.remove(key).map(|_| ()))
    }
}

/// Process-local store; nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().ok().and_then(|e| e.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }
}
