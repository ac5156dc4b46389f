//! Subscription manager for broadcasting state changes.

use crate::error::Result;
use crate::selectors::{compose_selectors, ComposedSelector, DerivedValues};
use crate::state::Snapshot;
use crate::types::ListenerId;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::{DropReason, StoreEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId};

/// Callback run after every snapshot change.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Internal subscription state.
struct Subscription {
    selector: ComposedSelector,
    /// Last values delivered (or the initial values).
    last: DerivedValues,
    sender: Sender<StoreEvent>,
}

impl Subscription {
    /// Try to send an event. Returns the drop reason if the subscriber must go.
    fn try_send(&self, event: StoreEvent) -> Option<DropReason> {
        match self.sender.try_send(event) {
            Ok(()) => None,
            Err(TrySendError::Full(_)) => Some(DropReason::BufferOverflow),
            Err(TrySendError::Disconnected(_)) => Some(DropReason::Disconnected),
        }
    }
}

/// Manages listeners and selector subscriptions.
pub struct SubscriptionManager {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Plain callbacks, in registration order.
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    /// Counter for generating subscription and listener IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Watch a selector map against the current snapshot.
    ///
    /// The returned handle carries the current derived values; later events
    /// arrive only when those values change.
    pub fn subscribe(
        &self,
        config: SubscriptionConfig,
        current: &Snapshot,
    ) -> Result<SubscriptionHandle> {
        let selector = compose_selectors(&config.selectors);
        let initial = selector.evaluate(current)?;

        let id = SubscriptionId(self.next_id());
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        let subscription = Subscription {
            selector,
            last: initial.clone(),
            sender,
        };
        self.subscriptions.write().insert(id, subscription);
        tracing::debug!(id = id.0, selectors = config.selectors.len(), "subscribed");

        Ok(SubscriptionHandle {
            id,
            initial,
            receiver,
        })
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.write();
        match subs.remove(&id) {
            Some(sub) => {
                // Best effort; the receiver may already be gone.
                let _ = sub.sender.try_send(StoreEvent::Dropped {
                    reason: DropReason::Unsubscribed,
                });
                true
            }
            None => false,
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Register a callback run with every new snapshot.
    pub fn listen(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.write().push((id, listener));
        id
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    // --- Broadcasting ---

    /// Tell everyone about a new snapshot: listeners first, then selector
    /// subscriptions.
    pub fn notify(&self, snapshot: &Snapshot) {
        self.notify_listeners(snapshot, || true);
        self.broadcast(snapshot);
    }

    /// Run every listener with `snapshot` while `is_current` holds.
    ///
    /// `is_current` is checked before each call. Once it returns false the
    /// remaining listeners are skipped, since a newer snapshot has already
    /// reached them. Returns false if any listener was skipped.
    ///
    /// No internal lock is held while listeners run, so they may dispatch,
    /// subscribe or unlisten.
    pub fn notify_listeners(&self, snapshot: &Snapshot, is_current: impl Fn() -> bool) -> bool {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            if !is_current() {
                return false;
            }
            listener(snapshot);
        }
        true
    }

    /// Re-evaluate every subscription and send `Changed` where the derived
    /// values differ from the last ones. Drops subscribers that fail to
    /// receive.
    pub fn broadcast(&self, snapshot: &Snapshot) {
        let mut to_remove = Vec::new();

        {
            let mut subs = self.subscriptions.write();
            for (id, sub) in subs.iter_mut() {
                let values = match sub.selector.evaluate(snapshot) {
                    Ok(values) => values,
                    Err(e) => {
                        to_remove.push((*id, DropReason::Error(e.to_string())));
                        continue;
                    }
                };

                if values == sub.last {
                    continue;
                }

                let event = StoreEvent::Changed {
                    version: snapshot.version(),
                    values: values.clone(),
                };
                match sub.try_send(event) {
                    None => sub.last = values,
                    Some(reason) => to_remove.push((*id, reason)),
                }
            }
        }

        // Remove dropped subscriptions
        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for (id, reason) in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    tracing::warn!(id = id.0, ?reason, "dropping subscriber");
                    // Might fail on a full buffer, that's ok
                    let _ = sub.sender.try_send(StoreEvent::Dropped { reason });
                }
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
