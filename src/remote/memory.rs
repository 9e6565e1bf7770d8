//! In-memory realtime collection, standing in for the hosted database.
//!
//! Every mutation rebroadcasts the complete keyed state to all live
//! subscribers, matching the snapshot-per-change contract of the remote
//! service. Used by the demo binary and integration tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::remote::{CollectionEvent, RemoteCollection, Subscription, EVENT_BUFFER};

#[derive(Default)]
struct PathState {
    entries: BTreeMap<String, Value>,
    subscribers: Vec<mpsc::Sender<CollectionEvent>>,
}

impl PathState {
    /// Send an event to all live subscribers, pruning closed ones.
    fn broadcast(&mut self, event: CollectionEvent) {
        self.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Subscriber event buffer full, dropping snapshot");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    fn broadcast_snapshot(&mut self) {
        let snapshot = CollectionEvent::Snapshot(self.entries.clone());
        self.broadcast(snapshot);
    }
}

/// Thread-safe in-memory collection store, keyed by path.
#[derive(Default)]
pub struct MemoryCollection {
    paths: Mutex<HashMap<String, PathState>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an entry under an explicit key and notify subscribers.
    pub fn put(&self, path: &str, key: &str, value: Value) {
        let mut paths = self.lock_paths();
        let state = paths.entry(path.to_string()).or_default();
        state.entries.insert(key.to_string(), value);
        state.broadcast_snapshot();
    }

    /// Add an entry under a generated key, returning the key.
    pub fn push(&self, path: &str, value: Value) -> String {
        let key = Uuid::new_v4().to_string();
        self.put(path, &key, value);
        key
    }

    /// Remove an entry and notify subscribers. No-op for unknown keys.
    pub fn remove(&self, path: &str, key: &str) {
        let mut paths = self.lock_paths();
        let state = paths.entry(path.to_string()).or_default();
        if state.entries.remove(key).is_some() {
            state.broadcast_snapshot();
        }
    }

    /// Inject a subscription error for all subscribers of a path.
    pub fn fail(&self, path: &str, message: &str) {
        let mut paths = self.lock_paths();
        let state = paths.entry(path.to_string()).or_default();
        state.broadcast(CollectionEvent::Error(message.to_string()));
    }

    /// Number of entries currently stored under a path
    pub fn entry_count(&self, path: &str) -> usize {
        self.lock_paths()
            .get(path)
            .map(|s| s.entries.len())
            .unwrap_or(0)
    }

    /// Number of subscribers still registered under a path. Closed
    /// subscribers are only pruned on broadcast, so this can overcount
    /// until the next mutation.
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.lock_paths()
            .get(path)
            .map(|s| s.subscribers.len())
            .unwrap_or(0)
    }

    fn lock_paths(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathState>> {
        // Lock poisoning only happens if a holder panicked; propagate the panic.
        self.paths.lock().expect("collection lock poisoned")
    }
}

impl RemoteCollection for MemoryCollection {
    fn subscribe(&self, path: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut paths = self.lock_paths();
        let state = paths.entry(path.to_string()).or_default();

        // Initial snapshot: the complete current state, delivered immediately.
        let initial = CollectionEvent::Snapshot(state.entries.clone());
        if tx.try_send(initial).is_ok() {
            state.subscribers.push(tx);
        }

        tracing::debug!(path, subscribers = state.subscribers.len(), "Subscription attached");
        Subscription::new(rx)
    }
}
