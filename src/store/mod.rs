//! The job store: owns the in-memory collection, the lifecycle of the one
//! remote subscription, and the loading-skeleton timing.
//!
//! All mutation funnels through a single command channel processed by
//! [`JobStore::run`], so attach checks are check-then-act race-free. Each
//! attach cycle gets an epoch; a timer or subscription event carrying a
//! stale epoch (from a cycle ended by error or detach) is discarded instead
//! of touching the fresh cycle's rendezvous gate.

pub mod gate;
pub mod state;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::StoreConfig;
use crate::error::{JobTrackError, Result};
use crate::job::Job;
use crate::remote::{CollectionEvent, RemoteCollection};
use crate::store::state::StoreState;

/// Commands and events processed by the store loop
#[derive(Debug)]
pub enum StoreMessage {
    /// Attach the remote listener if not already attached (idempotent)
    EnsureListenerActive,
    /// Release the remote listener, allowing a later re-attach
    DetachListener,
    /// The minimum-skeleton timer for an attach cycle elapsed
    SkeletonTimerFired { epoch: u64 },
    /// An event from the subscription of an attach cycle
    Remote { epoch: u64, event: CollectionEvent },
}

/// Handle for the currently attached subscription. The forwarder task owns
/// the `Subscription`; aborting it drops the subscription and detaches.
struct ActiveListener {
    forwarder: JoinHandle<()>,
}

impl ActiveListener {
    fn release(self) {
        self.forwarder.abort();
    }
}

/// Reactive store for the tracked job applications.
pub struct JobStore {
    pub state: Arc<RwLock<StoreState>>,
    config: StoreConfig,
    remote: Arc<dyn RemoteCollection>,
    message_tx: mpsc::Sender<StoreMessage>,
    changes_tx: watch::Sender<u64>,
    shutdown: CancellationToken,
}

impl JobStore {
    pub fn new(
        remote: Arc<dyn RemoteCollection>,
        config: StoreConfig,
    ) -> (Self, mpsc::Receiver<StoreMessage>) {
        let (message_tx, message_rx) = mpsc::channel(config.command_buffer);
        let (changes_tx, _) = watch::channel(0);

        let store = Self {
            state: Arc::new(RwLock::new(StoreState::new())),
            config,
            remote,
            message_tx,
            changes_tx,
            shutdown: CancellationToken::new(),
        };

        (store, message_rx)
    }

    /// Sender for external communication with the store loop
    pub fn message_sender(&self) -> mpsc::Sender<StoreMessage> {
        self.message_tx.clone()
    }

    /// Idempotent attach entry point. Safe to call on every route entry;
    /// duplicates while a listener is held or an attach is in flight are
    /// no-ops inside the loop.
    pub async fn ensure_listener_active(&self) -> Result<()> {
        self.message_tx
            .send(StoreMessage::EnsureListenerActive)
            .await
            .map_err(|_| JobTrackError::StoreClosed)
    }

    /// Release the remote subscription. A later
    /// [`ensure_listener_active`](Self::ensure_listener_active) re-attaches.
    pub async fn detach_listener(&self) -> Result<()> {
        self.message_tx
            .send(StoreMessage::DetachListener)
            .await
            .map_err(|_| JobTrackError::StoreClosed)
    }

    /// Revision counter bumped after every state mutation. Consumers await
    /// `changed()` instead of polling.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes_tx.subscribe()
    }

    /// Derived view: jobs ordered by `updated_at` descending
    pub async fn sorted_jobs(&self) -> Vec<Job> {
        self.state.read().await.sorted_jobs()
    }

    /// Stop the store loop. The subscription drops with it.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run the store event loop until shutdown or channel closure.
    pub async fn run(&self, mut message_rx: mpsc::Receiver<StoreMessage>) {
        let mut active: Option<ActiveListener> = None;
        let mut epoch: u64 = 0;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,

                msg = message_rx.recv() => {
                    let Some(msg) = msg else { break };
                    match msg {
                        StoreMessage::EnsureListenerActive => {
                            self.handle_ensure(&mut active, &mut epoch).await;
                        }
                        StoreMessage::DetachListener => {
                            self.handle_detach(&mut active).await;
                        }
                        StoreMessage::SkeletonTimerFired { epoch: cycle } => {
                            self.handle_timer(cycle, epoch).await;
                        }
                        StoreMessage::Remote { epoch: cycle, event } => {
                            self.handle_remote(cycle, epoch, event, &mut active).await;
                        }
                    }
                }
            }
        }

        if let Some(listener) = active.take() {
            listener.release();
        }
        tracing::debug!("Store loop exited");
    }

    async fn handle_ensure(&self, active: &mut Option<ActiveListener>, epoch: &mut u64) {
        if active.is_some() {
            tracing::trace!("Jobs listener already active, no new attach needed");
            return;
        }
        if self.state.read().await.is_currently_fetching {
            tracing::debug!("Attach already in flight, skipping duplicate call");
            return;
        }

        *epoch += 1;
        let cycle = *epoch;

        self.state.write().await.begin_attach();
        self.notify_changed();

        // One-shot minimum-skeleton timer for this cycle
        let timer_tx = self.message_tx.clone();
        let min_duration = self.config.skeleton_min_duration;
        tokio::spawn(async move {
            tokio::time::sleep(min_duration).await;
            let _ = timer_tx
                .send(StoreMessage::SkeletonTimerFired { epoch: cycle })
                .await;
        });

        tracing::info!(
            path = %self.config.collection_path,
            epoch = cycle,
            "Attaching persistent jobs listener"
        );

        let mut subscription = self.remote.subscribe(&self.config.collection_path);
        let event_tx = self.message_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if event_tx
                    .send(StoreMessage::Remote { epoch: cycle, event })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            // Remote stream ended without an error event; surfaces as silence
        });

        *active = Some(ActiveListener { forwarder });
    }

    async fn handle_detach(&self, active: &mut Option<ActiveListener>) {
        match active.take() {
            Some(listener) => {
                listener.release();
                tracing::debug!("Detached jobs listener");
            }
            None => tracing::trace!("No jobs listener to detach"),
        }
        self.state.write().await.detach();
        self.notify_changed();
    }

    async fn handle_timer(&self, cycle: u64, current_epoch: u64) {
        if cycle != current_epoch {
            tracing::debug!(cycle, current_epoch, "Ignoring stale skeleton timer");
            return;
        }
        let mut state = self.state.write().await;
        let was_fetching = state.is_currently_fetching;
        state.timer_fired();
        let cleared = was_fetching && !state.is_currently_fetching;
        drop(state);

        if cleared {
            self.notify_changed();
        }
    }

    async fn handle_remote(
        &self,
        cycle: u64,
        current_epoch: u64,
        event: CollectionEvent,
        active: &mut Option<ActiveListener>,
    ) {
        if cycle != current_epoch {
            tracing::debug!(cycle, current_epoch, "Ignoring event from stale subscription");
            return;
        }

        match event {
            CollectionEvent::Snapshot(entries) => {
                let jobs = decode_snapshot(entries);
                tracing::debug!(count = jobs.len(), "Jobs updated from remote snapshot");
                self.state.write().await.apply_snapshot(jobs);
                self.notify_changed();
            }
            CollectionEvent::Error(message) => {
                tracing::warn!(error = %message, "Subscription error from remote collection");
                self.state.write().await.apply_error(message);
                // Release the handle so a later ensure call can re-attach;
                // stale events from this cycle are fenced off by the epoch.
                if let Some(listener) = active.take() {
                    listener.release();
                }
                self.notify_changed();
            }
        }
    }

    fn notify_changed(&self) {
        self.changes_tx.send_modify(|rev| *rev += 1);
    }
}

/// Decode a keyed snapshot into job records, assigning ids from entry keys.
/// Undecodable entries are skipped with a warning; one bad entry never
/// discards the rest of the snapshot.
fn decode_snapshot(entries: BTreeMap<String, Value>) -> Vec<Job> {
    entries
        .into_iter()
        .filter_map(|(key, value)| match Job::from_entry(&key, value) {
            Ok(job) => Some(job),
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "Skipping undecodable job entry");
                None
            }
        })
        .collect()
}
