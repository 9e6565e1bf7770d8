//! Shared helpers for store integration tests: a scriptable stub backend
//! and a spawned store with polling waits on shortened durations.
#![allow(dead_code)] // each test crate uses a different subset of the helpers

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use jobtrack::config::StoreConfig;
use jobtrack::remote::{CollectionEvent, RemoteCollection, Subscription};
use jobtrack::store::state::StoreState;
use jobtrack::store::JobStore;

/// Interval between condition polls
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Remote collection whose events are emitted by the test itself.
/// Each `subscribe` hands the test a fresh sender.
#[derive(Default)]
pub struct StubCollection {
    senders: Mutex<Vec<mpsc::Sender<CollectionEvent>>>,
    subscribe_count: AtomicUsize,
}

impl StubCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }

    /// Sender feeding the most recent subscription
    pub fn latest_sender(&self) -> mpsc::Sender<CollectionEvent> {
        self.senders
            .lock()
            .unwrap()
            .last()
            .expect("no subscription attached yet")
            .clone()
    }

    /// Sender feeding the n-th subscription (0-based)
    pub fn sender_for(&self, index: usize) -> mpsc::Sender<CollectionEvent> {
        self.senders.lock().unwrap()[index].clone()
    }
}

impl RemoteCollection for StubCollection {
    fn subscribe(&self, _path: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(16);
        self.senders.lock().unwrap().push(tx);
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        Subscription::new(rx)
    }
}

/// Well-formed wire job entry for snapshots
pub fn job_value(title: &str, updated_at: Option<i64>) -> Value {
    let mut value = json!({
        "title": title,
        "company": "company",
        "description": "description",
        "status": "applied",
    });
    if let Some(ts) = updated_at {
        value["updatedAt"] = json!(ts);
    }
    value
}

/// Snapshot event built from `(key, updated_at)` pairs; titles mirror keys
pub fn snapshot(entries: &[(&str, Option<i64>)]) -> CollectionEvent {
    let map: BTreeMap<String, Value> = entries
        .iter()
        .map(|(key, ts)| (key.to_string(), job_value(key, *ts)))
        .collect();
    CollectionEvent::Snapshot(map)
}

/// A store spawned against a stub backend, torn down on drop
pub struct TestStore {
    pub store: Arc<JobStore>,
    pub collection: Arc<StubCollection>,
    runner: JoinHandle<()>,
}

impl TestStore {
    pub fn spawn(skeleton_min: Duration) -> Self {
        let collection = Arc::new(StubCollection::new());
        let config = StoreConfig::default().with_skeleton_min_duration(skeleton_min);
        let (store, message_rx) = JobStore::new(collection.clone(), config);
        let store = Arc::new(store);

        let runner = {
            let store = store.clone();
            tokio::spawn(async move { store.run(message_rx).await })
        };

        Self {
            store,
            collection,
            runner,
        }
    }

    pub async fn is_fetching(&self) -> bool {
        self.store.state.read().await.is_currently_fetching
    }

    /// Emit an event on the most recent subscription
    pub async fn emit(&self, event: CollectionEvent) {
        self.collection
            .latest_sender()
            .send(event)
            .await
            .expect("subscription closed");
    }

    /// Poll until a state predicate holds, panicking on timeout
    pub async fn wait_until<F>(&self, what: &str, timeout: Duration, mut check: F)
    where
        F: FnMut(&StoreState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let state = self.store.state.read().await;
                if check(&state) {
                    return;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("timed out waiting for {what}");
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Poll until the backend has seen `count` subscribe calls
    pub async fn wait_subscribed(&self, count: usize, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.collection.subscribe_count() < count {
            if tokio::time::Instant::now() >= deadline {
                panic!(
                    "timed out waiting for {count} subscriptions (saw {})",
                    self.collection.subscribe_count()
                );
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Ids of the current collection in arrival order
    pub async fn job_ids(&self) -> Vec<String> {
        self.store
            .state
            .read()
            .await
            .jobs
            .iter()
            .map(|j| j.id.clone())
            .collect()
    }
}

impl Drop for TestStore {
    fn drop(&mut self) {
        self.store.shutdown();
        self.runner.abort();
    }
}
