//! Field-value snapshots
//!
//! Form data lives in an external reactive store. This crate only sees it as
//! a flat, string-keyed snapshot of JSON values.

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Flat snapshot of field values keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSnapshot {
    values: BTreeMap<String, Value>,
}

impl FieldSnapshot {
    /// Create empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; any other value yields an empty snapshot
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from(map),
            _ => Self::default(),
        }
    }

    /// With one field set
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Value only when it is filled (see [`is_filled_value`])
    #[inline]
    #[must_use]
    pub fn get_filled(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| is_filled_value(v))
    }

    /// Whether the key holds a filled value
    #[inline]
    #[must_use]
    pub fn is_filled(&self, key: &str) -> bool {
        self.get_filled(key).is_some()
    }

    /// Iterate over keys in lexicographic order
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over entries in key order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for FieldSnapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, Value)> for FieldSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Whether a value counts as filled
///
/// Null, blank strings and empty arrays/objects are empty; numbers and
/// booleans are always filled.
#[must_use]
pub fn is_filled_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Callback invoked with the key of a changed field
pub type FieldListener = Box<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`FieldStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSubscription(pub u64);

/// Contract of the external field-value store
pub trait FieldStore: Send + Sync {
    /// Current values as a flat snapshot
    fn snapshot(&self) -> FieldSnapshot;

    /// Write one field
    fn write(&self, key: &str, value: Value);

    /// Register a change listener
    fn subscribe(&self, listener: FieldListener) -> FieldSubscription;

    /// Drop a listener; returns whether it was registered
    fn unsubscribe(&self, subscription: FieldSubscription) -> bool;
}

/// In-process [`FieldStore`]
#[derive(Default)]
pub struct MemoryFieldStore {
    values: RwLock<FieldSnapshot>,
    listeners: Mutex<Vec<(FieldSubscription, Arc<dyn Fn(&str) + Send + Sync>)>>,
    next_subscription: AtomicU64,
}

impl MemoryFieldStore {
    /// Create store with initial values
    #[must_use]
    pub fn new(initial: FieldSnapshot) -> Self {
        Self {
            values: RwLock::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Read one value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Number of registered listeners
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl std::fmt::Debug for MemoryFieldStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFieldStore")
            .field("fields", &self.values.read().len())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl FieldStore for MemoryFieldStore {
    fn snapshot(&self) -> FieldSnapshot {
        self.values.read().clone()
    }

    fn write(&self, key: &str, value: Value) {
        self.values.write().insert(key, value);
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(key);
        }
    }

    fn subscribe(&self, listener: FieldListener) -> FieldSubscription {
        let id = FieldSubscription(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::from(listener)));
        id
    }

    fn unsubscribe(&self, subscription: FieldSubscription) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }
}
