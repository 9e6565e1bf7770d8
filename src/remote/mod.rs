//! Boundary to the remote live-updating collection.
//!
//! The hosted realtime database is a black box behind [`RemoteCollection`]:
//! a subscribe call yields a stream of [`CollectionEvent`]s, where every
//! snapshot carries the complete keyed state of the collection. Dropping the
//! returned [`Subscription`] detaches it.

pub mod memory;

use std::collections::BTreeMap;

use serde_json::Value;
use tokio::sync::mpsc;

/// Capacity of a subscription's event channel
pub(crate) const EVENT_BUFFER: usize = 64;

/// An inbound event from the remote collection.
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    /// Complete current state of the collection, keyed by entry id.
    /// Delivered on attach and on every subsequent change.
    Snapshot(BTreeMap<String, Value>),
    /// Subscription failure (network/permission/remote). Terminal for the
    /// stream: the remote never reconnects on its own.
    Error(String),
}

/// Handle to an attached subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<CollectionEvent>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<CollectionEvent>) -> Self {
        Self { events }
    }

    /// Receive the next event. `None` means the remote side is gone.
    pub async fn recv(&mut self) -> Option<CollectionEvent> {
        self.events.recv().await
    }
}

/// A remote collection that can be subscribed to by path.
pub trait RemoteCollection: Send + Sync {
    /// Attach a persistent listener. The current state of the collection is
    /// delivered as the first snapshot.
    fn subscribe(&self, path: &str) -> Subscription;
}
