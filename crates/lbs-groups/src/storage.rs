//! Persistence of the group configuration blob
//!
//! The configuration is stored as one JSON document under a fixed key. The
//! backend itself lives outside this workspace; [`KeyValueStorage`] is the
//! narrow contract it has to satisfy.

use crate::error::{CodecError, StorageError};
use lbs_model::GroupConfig;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Default key of the persisted configuration
pub const DEFAULT_STORAGE_KEY: &str = "lbs.group-config";

/// String key/value storage backend
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Errors
    /// Returns `StorageError` if the backend fails
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`
    ///
    /// # Errors
    /// Returns `StorageError` if the backend fails
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage holding one entry
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.entries.lock().insert(key.into(), value.into());
        storage
    }

    /// Raw stored value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Serialize a configuration to its persisted JSON form
///
/// # Errors
/// Returns `CodecError` if serialization fails
pub fn encode_config(config: &GroupConfig) -> Result<String, CodecError> {
    Ok(serde_json::to_string(config)?)
}

/// Parse a persisted configuration
///
/// Groups are re-normalized on the way in, so an active set that drifted
/// outside its eligible set is repaired here.
///
/// # Errors
/// Returns `CodecError::Malformed` for invalid JSON
pub fn decode_config(raw: &str) -> Result<GroupConfig, CodecError> {
    Ok(serde_json::from_str(raw)?)
}
