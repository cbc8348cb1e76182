//! KeyStore implementation
//!
//! HashMap guarded by a parking_lot RwLock.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{KeyvError, Result};

/// In-memory key/value map
///
/// Every operation holds its lock for a single map access, so no caller can
/// block another for longer than one lookup or insert.
#[derive(Debug, Default)]
pub struct KeyStore {
    data: RwLock<HashMap<String, String>>,
}

impl KeyStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current value for `key` (read lock)
    pub fn get(&self, key: &str) -> Result<String> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or(KeyvError::NotFound)
    }

    /// Insert or overwrite `key` (write lock)
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.data.write().insert(key.into(), value.into());
        Ok(())
    }

    /// Remove `key`; absent keys are a no-op (write lock)
    pub fn delete(&self, key: &str) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of the full contents, for comparisons and inspection
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }
}
