//! In-process change feed.
//!
//! Every successful backend write publishes a [`ChangeEvent`] on a
//! `tokio::sync::broadcast` channel. A [`Subscription`] pairs a receiver with
//! a [`ChangeFilter`] and releases itself from the feed when dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use crate::types::change::{ChangeEvent, ChangeFilter};

/// Broadcast hub for row-change notifications.
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
    next_seq: AtomicU64,
    registry: Arc<Registry>,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    active: Mutex<HashMap<u64, ChangeFilter>>,
}

impl Registry {
    fn register(&self, filter: &ChangeFilter) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut active) = self.active.lock() {
            active.insert(id, filter.clone());
        }
        id
    }

    fn release(&self, id: u64) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&id);
        }
    }

    fn count(&self) -> usize {
        self.active.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl ChangeFeed {
    /// Creates a feed that buffers up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_seq: AtomicU64::new(0),
            registry: Arc::new(Registry::default()),
        }
    }

    /// Publishes an event to every live subscription. Returns how many
    /// receivers were handed the event (before filtering).
    pub fn publish(&self, mut event: ChangeEvent) -> usize {
        event.seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            seq = event.seq,
            table = event.table.as_str(),
            kind = ?event.kind,
            owner = %event.owner_id,
            "publishing change event"
        );
        // No receivers is not an error: nobody is watching.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        let id = self.registry.register(&filter);
        debug!(subscription = id, table = filter.table.as_str(), "subscribed");
        Subscription {
            id,
            filter,
            receiver: self.sender.subscribe(),
            registry: Arc::clone(&self.registry),
            lagged: false,
        }
    }

    /// Number of subscriptions that have not been released yet.
    pub fn active_subscriptions(&self) -> usize {
        self.registry.count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A live, filtered listener on a [`ChangeFeed`].
///
/// When the subscriber falls more than the feed capacity behind, the
/// oldest events are dropped and the subscription is marked lagged until
/// [`Subscription::take_lagged`] is called. State built from its events is
/// then incomplete and must be reloaded.
pub struct Subscription {
    id: u64,
    filter: ChangeFilter,
    receiver: broadcast::Receiver<ChangeEvent>,
    registry: Arc<Registry>,
    lagged: bool,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    /// Returns the next matching event without blocking, or `None` when the
    /// buffer holds nothing more for this subscription.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(subscription = self.id, skipped, "change feed lagged, events dropped");
                    self.lagged = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next matching event. Returns `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(subscription = self.id, skipped, "change feed lagged, events dropped");
                    self.lagged = true;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Whether events were dropped since the last call. Clears the mark.
    pub fn take_lagged(&mut self) -> bool {
        std::mem::take(&mut self.lagged)
    }

    /// Releases the subscription. Equivalent to dropping it.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.release(self.id);
        debug!(subscription = self.id, "unsubscribed");
    }
}
