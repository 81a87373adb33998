//! Group configuration store
//!
//! Owns the [`GroupConfig`] of one document:
//! - every mutation is a single read-modify-write of the whole aggregate
//! - the new state is persisted synchronously, then broadcast to subscribers
//! - persistence failures are logged and swallowed; the in-memory state
//!   still advances and the store is marked dirty until a later save succeeds

use crate::error::{StorageError, StoreError, StoreResult};
use crate::storage::{decode_config, encode_config, KeyValueStorage, DEFAULT_STORAGE_KEY};
use lbs_model::{Group, GroupConfig, GroupType};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by [`GroupConfigStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Returns `false` once it no longer wants notifications
type Listener = Arc<dyn Fn(&GroupConfig) -> bool + Send + Sync>;

/// Store of AISD/AISI groups
pub struct GroupConfigStore {
    state: RwLock<GroupConfig>,
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
    dirty: AtomicBool,
}

impl GroupConfigStore {
    /// Create store with an explicit initial state
    ///
    /// The initial state is persisted right away.
    #[must_use]
    pub fn create(
        initial: GroupConfig,
        storage: Arc<dyn KeyValueStorage>,
        key: impl Into<String>,
    ) -> Self {
        let store = Self::with_state(initial, storage, key.into());
        let snapshot = store.snapshot();
        store.persist(&snapshot);
        store
    }

    /// Create store from whatever is persisted under `key`
    ///
    /// A missing, unreadable or malformed blob yields an empty configuration.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let initial = match storage.read(&key) {
            Ok(Some(raw)) => match decode_config(&raw) {
                Ok(config) => {
                    tracing::info!(
                        key = %key,
                        aisd = config.aisd.len(),
                        aisi = config.aisi.len(),
                        "loaded group configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "ignoring malformed group configuration");
                    GroupConfig::default()
                }
            },
            Ok(None) => GroupConfig::default(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "group configuration could not be read");
                GroupConfig::default()
            }
        };
        Self::with_state(initial, storage, key)
    }

    /// Load from the default key
    #[inline]
    #[must_use]
    pub fn load_default(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::load(storage, DEFAULT_STORAGE_KEY)
    }

    fn with_state(initial: GroupConfig, storage: Arc<dyn KeyValueStorage>, key: String) -> Self {
        Self {
            state: RwLock::new(initial),
            storage,
            key,
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            dirty: AtomicBool::new(false),
        }
    }

    /// Copy of the current configuration
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> GroupConfig {
        self.state.read().clone()
    }

    /// Storage key of this store
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the latest state failed to persist
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Replace the group at index 0, or append if the type has none
    pub fn set_primary(&self, group_type: GroupType, group: Group) {
        self.mutate("set_primary", |config| {
            let groups = config.groups_mut(group_type);
            let group = retyped(group, group_type);
            match groups.first_mut() {
                Some(first) => *first = group,
                None => groups.push(group),
            }
        });
    }

    /// Append a group and return its index
    pub fn append(&self, group_type: GroupType, group: Group) -> usize {
        self.mutate("append", |config| {
            let groups = config.groups_mut(group_type);
            groups.push(retyped(group, group_type));
            groups.len() - 1
        })
    }

    /// Replace the active CCPP set of one group
    ///
    /// Codes outside the group's eligible set are dropped silently.
    ///
    /// # Errors
    /// Returns `StoreError::GroupNotFound` if there is no group at `index`
    pub fn set_active_ccpp<I, S>(&self, group_type: GroupType, codes: I, index: usize) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.try_mutate("set_active_ccpp", |config| {
            let group = config
                .groups_mut(group_type)
                .get_mut(index)
                .ok_or_else(|| StoreError::not_found(group_type, index))?;
            group.set_active(codes);
            Ok(())
        })
    }

    /// Replace the eligible CCPP set of one group
    ///
    /// # Errors
    /// Returns `StoreError::GroupNotFound` if there is no group at `index`
    pub fn set_eligible_ccpp<I, S>(&self, group_type: GroupType, codes: I, index: usize) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.try_mutate("set_eligible_ccpp", |config| {
            let group = config
                .groups_mut(group_type)
                .get_mut(index)
                .ok_or_else(|| StoreError::not_found(group_type, index))?;
            group.set_eligible(codes);
            Ok(())
        })
    }

    /// Rename one group
    ///
    /// # Errors
    /// Returns `StoreError::GroupNotFound` if there is no group at `index`
    pub fn rename_group(&self, group_type: GroupType, index: usize, name: impl Into<String>) -> StoreResult<()> {
        let name = name.into();
        self.try_mutate("rename_group", |config| {
            let group = config
                .groups_mut(group_type)
                .get_mut(index)
                .ok_or_else(|| StoreError::not_found(group_type, index))?;
            group.name = name;
            Ok(())
        })
    }

    /// Remove one group
    ///
    /// Later groups shift down one position, and so do their suffixes.
    ///
    /// # Errors
    /// - `StoreError::GroupNotFound` if there is no group at `index`
    /// - `StoreError::LastRequiredGroup` when removing the only AISD group
    pub fn remove_group(&self, group_type: GroupType, index: usize) -> StoreResult<Group> {
        self.try_mutate("remove_group", |config| {
            let groups = config.groups_mut(group_type);
            if index >= groups.len() {
                return Err(StoreError::not_found(group_type, index));
            }
            if group_type == GroupType::Aisd && groups.len() == 1 {
                return Err(StoreError::LastRequiredGroup(group_type));
            }
            Ok(groups.remove(index))
        })
    }

    /// Group at `index`
    #[must_use]
    pub fn get_group(&self, group_type: GroupType, index: usize) -> Option<Group> {
        self.state.read().groups(group_type).get(index).cloned()
    }

    /// All groups of a type
    #[must_use]
    pub fn get_all(&self, group_type: GroupType) -> Vec<Group> {
        self.state.read().groups(group_type).to_vec()
    }

    /// Remove every group of a type
    pub fn clear(&self, group_type: GroupType) {
        self.mutate("clear", |config| config.groups_mut(group_type).clear());
    }

    /// Remove every group
    pub fn clear_all(&self) {
        self.mutate("clear_all", |config| {
            config.aisd.clear();
            config.aisi.clear();
        });
    }

    /// Register a listener called after every committed mutation
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&GroupConfig) + Send + Sync + 'static,
    {
        self.subscribe_while(move |config| {
            listener(config);
            true
        })
    }

    /// Register a listener that stays registered while it returns `true`
    ///
    /// A listener returning `false` is removed after the commit it was
    /// notified about.
    pub fn subscribe_while<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&GroupConfig) -> bool + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    /// Number of registered listeners
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Persist the current state again
    ///
    /// # Errors
    /// Returns `StoreError::Persistence` if the backend still fails
    pub fn flush(&self) -> StoreResult<()> {
        let snapshot = self.snapshot();
        self.write_through(&snapshot)?;
        self.dirty.store(false, Ordering::Release);
        Ok(())
    }

    /// End the store's lifecycle
    ///
    /// Drops every listener and makes a last attempt to persist a dirty state.
    pub fn dispose(self) -> GroupConfig {
        self.listeners.lock().clear();
        if self.is_dirty() {
            if let Err(e) = self.flush() {
                tracing::warn!(key = %self.key, error = %e, "discarding unpersisted group configuration");
            }
        }
        self.state.into_inner()
    }

    fn mutate<R>(&self, op: &'static str, f: impl FnOnce(&mut GroupConfig) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let result = f(&mut state);
            state.last_updated = Some(now_millis(state.last_updated));
            (result, state.clone())
        };
        self.commit(op, &snapshot);
        result
    }

    fn try_mutate<R>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut GroupConfig) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let (result, snapshot) = {
            let mut state = self.state.write();
            let mut next = state.clone();
            let result = f(&mut next)?;
            next.last_updated = Some(now_millis(state.last_updated));
            *state = next.clone();
            (result, next)
        };
        self.commit(op, &snapshot);
        Ok(result)
    }

    fn commit(&self, op: &'static str, snapshot: &GroupConfig) {
        tracing::info!(
            op,
            aisd = snapshot.aisd.len(),
            aisi = snapshot.aisi.len(),
            "group configuration committed"
        );
        self.persist(snapshot);
        self.notify(snapshot);
    }

    fn persist(&self, snapshot: &GroupConfig) {
        match self.write_through(snapshot) {
            Ok(()) => self.dirty.store(false, Ordering::Release),
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                tracing::warn!(key = %self.key, error = %e, "group configuration not persisted");
            }
        }
    }

    fn write_through(&self, snapshot: &GroupConfig) -> StoreResult<()> {
        let raw = encode_config(snapshot)
            .map_err(|e| StorageError::write_failed(&self.key, e.to_string()))?;
        self.storage.write(&self.key, &raw)?;
        Ok(())
    }

    fn notify(&self, snapshot: &GroupConfig) {
        let listeners: Vec<(SubscriptionId, Listener)> = self
            .listeners
            .lock()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();
        let retired: Vec<SubscriptionId> = listeners
            .into_iter()
            .filter_map(|(id, listener)| (!listener(snapshot)).then_some(id))
            .collect();
        if !retired.is_empty() {
            tracing::debug!(count = retired.len(), "retiring group listeners");
            self.listeners.lock().retain(|(id, _)| !retired.contains(id));
        }
    }
}

impl fmt::Debug for GroupConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("GroupConfigStore")
            .field("key", &self.key)
            .field("aisd", &state.aisd.len())
            .field("aisi", &state.aisi.len())
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

/// Groups stored under a type always carry that type
fn retyped(mut group: Group, group_type: GroupType) -> Group {
    group.group_type = group_type;
    group
}

/// Wall-clock millis, never going backwards relative to `previous`
fn now_millis(previous: Option<i64>) -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    previous.map_or(now, |prev| now.max(prev + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, MockKeyValueStorage};
    use std::sync::atomic::AtomicUsize;

    fn memory_store() -> (GroupConfigStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = GroupConfigStore::load(storage.clone(), DEFAULT_STORAGE_KEY);
        (store, storage)
    }

    fn group(name: &str, codes: &[&str]) -> Group {
        Group::new(name, GroupType::Aisd, codes)
    }

    #[test]
    fn set_primary_appends_then_replaces() {
        let (store, _) = memory_store();
        store.set_primary(GroupType::Aisd, group("one", &["1"]));
        store.set_primary(GroupType::Aisd, group("two", &["2"]));
        let all = store.get_all(GroupType::Aisd);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "two");
    }

    #[test]
    fn append_returns_index_and_retypes() {
        let (store, _) = memory_store();
        assert_eq!(store.append(GroupType::Aisi, group("x", &["1"])), 0);
        assert_eq!(store.append(GroupType::Aisi, group("y", &["2"])), 1);
        let second = store.get_group(GroupType::Aisi, 1).unwrap();
        assert_eq!(second.group_type, GroupType::Aisi);
    }

    #[test]
    fn set_active_filters_silently() {
        let (store, _) = memory_store();
        store.append(GroupType::Aisd, group("g", &["1", "2"]));
        store.set_active_ccpp(GroupType::Aisd, ["2", "77"], 0).unwrap();
        let g = store.get_group(GroupType::Aisd, 0).unwrap();
        let active: Vec<_> = g.active_ccpp().collect();
        assert_eq!(active, vec!["2"]);
    }

    #[test]
    fn set_active_on_missing_group_fails() {
        let (store, _) = memory_store();
        let err = store.set_active_ccpp(GroupType::Aisi, ["1"], 0).unwrap_err();
        assert_eq!(err, StoreError::not_found(GroupType::Aisi, 0));
    }

    #[test]
    fn last_aisd_group_is_protected() {
        let (store, _) = memory_store();
        store.append(GroupType::Aisd, group("a", &["1"]));
        store.append(GroupType::Aisd, group("b", &["2"]));
        assert_eq!(store.remove_group(GroupType::Aisd, 0).unwrap().name, "a");
        assert_eq!(
            store.remove_group(GroupType::Aisd, 0),
            Err(StoreError::LastRequiredGroup(GroupType::Aisd))
        );
        assert_eq!(store.get_all(GroupType::Aisd).len(), 1);
    }

    #[test]
    fn aisi_groups_can_all_be_removed() {
        let (store, _) = memory_store();
        store.append(GroupType::Aisi, Group::new("d", GroupType::Aisi, ["1"]));
        assert!(store.remove_group(GroupType::Aisi, 0).is_ok());
        assert!(store.get_all(GroupType::Aisi).is_empty());
    }

    #[test]
    fn mutations_are_persisted() {
        let (store, storage) = memory_store();
        store.append(GroupType::Aisd, group("persisted", &["1"]));
        let raw = storage.get(DEFAULT_STORAGE_KEY).unwrap();
        let reloaded = GroupConfigStore::load(storage.clone(), DEFAULT_STORAGE_KEY);
        assert!(raw.contains("persisted"));
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn last_updated_is_monotonic() {
        let (store, _) = memory_store();
        store.clear_all();
        let first = store.snapshot().last_updated.unwrap();
        store.clear_all();
        let second = store.snapshot().last_updated.unwrap();
        assert!(second > first);
    }

    #[test]
    fn failed_write_keeps_memory_state_and_marks_dirty() {
        let mut storage = MockKeyValueStorage::new();
        storage.expect_read().returning(|_| Ok(None));
        storage
            .expect_write()
            .returning(|key, _| Err(StorageError::write_failed(key, "quota")));

        let store = GroupConfigStore::load(Arc::new(storage), "k");
        store.append(GroupType::Aisd, group("kept", &["1"]));

        assert_eq!(store.get_all(GroupType::Aisd).len(), 1);
        assert!(store.is_dirty());
        assert!(matches!(store.flush(), Err(StoreError::Persistence(_))));
    }

    #[test]
    fn failed_read_starts_empty() {
        let mut storage = MockKeyValueStorage::new();
        storage
            .expect_read()
            .returning(|key| Err(StorageError::read_failed(key, "locked")));
        let store = GroupConfigStore::load(Arc::new(storage), "k");
        assert!(store.snapshot().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn malformed_blob_starts_empty() {
        let storage = Arc::new(MemoryStorage::with_entry("k", "[1,2,3]"));
        let store = GroupConfigStore::load(storage, "k");
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn subscribers_see_committed_state() {
        let (store, _) = memory_store();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let id = store.subscribe(move |config| {
            counter.store(config.aisd.len(), Ordering::SeqCst);
        });

        store.append(GroupType::Aisd, group("a", &["1"]));
        store.append(GroupType::Aisd, group("b", &["2"]));
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(store.unsubscribe(id));
        store.clear(GroupType::Aisd);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn listeners_returning_false_are_retired() {
        let (store, _) = memory_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.subscribe_while(move |_| counter.fetch_add(1, Ordering::SeqCst) == 0);
        store.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 2);

        store.append(GroupType::Aisd, group("a", &["1"]));
        store.append(GroupType::Aisd, group("b", &["2"]));
        store.clear(GroupType::Aisd);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn failed_operation_does_not_notify() {
        let (store, _) = memory_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.rename_group(GroupType::Aisd, 4, "nope").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispose_returns_final_state() {
        let (store, _) = memory_store();
        store.append(GroupType::Aisd, group("a", &["1"]));
        store.subscribe(|_| {});
        let config = store.dispose();
        assert_eq!(config.aisd.len(), 1);
    }
}
