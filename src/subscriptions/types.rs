//! Subscription types for live store updates.

use crate::error::StoreError;
use crate::selectors::{DerivedValues, SelectorMap};
use crate::types::Version;
use serde::{Deserialize, Serialize};

/// Default number of buffered events before a subscriber is dropped.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Selectors whose composed value is watched.
    pub selectors: SelectorMap,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            selectors: SelectorMap::new(),
        }
    }
}

impl SubscriptionConfig {
    /// Watch the given selectors with the default buffer.
    pub fn selectors(selectors: SelectorMap) -> Self {
        Self {
            selectors,
            ..Default::default()
        }
    }
}

/// Events emitted by subscriptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The derived values changed.
    Changed {
        version: Version,
        values: DerivedValues,
    },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiver went away.
    Disconnected,
    /// A selector failed to evaluate.
    Error(String),
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Derived values at the moment of subscribing.
    pub initial: DerivedValues,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<StoreEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StoreEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StoreEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StoreEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Block until the derived values change.
    ///
    /// Fails with [`StoreError::SubscriptionDropped`] once the subscription
    /// has been dropped or the store is gone.
    pub fn recv_changed(&self) -> crate::error::Result<(Version, DerivedValues)> {
        match self.receiver.recv() {
            Ok(StoreEvent::Changed { version, values }) => Ok((version, values)),
            Ok(StoreEvent::Dropped { reason }) => {
                tracing::debug!(id = self.id.0, ?reason, "subscription dropped");
                Err(StoreError::SubscriptionDropped)
            }
            Err(_) => Err(StoreError::SubscriptionDropped),
        }
    }

    /// Drain everything already queued.
    pub fn drain(&self) -> Vec<StoreEvent> {
        self.receiver.try_iter().collect()
    }
}
