//! Subscription system for live state updates.
//!
//! Two ways to hear about state changes:
//! - listeners: callbacks run with every new snapshot;
//! - selector subscriptions: a bounded channel that receives an event only
//!   when the watched selectors produce different derived values.
//!
//! Slow selector subscribers whose buffer fills up are dropped.
//!
//! # Example
//!
//! ```ignore
//! let selectors = SelectorMap::new()
//!     .with("username", |s: &Snapshot| user::selectors::username(s));
//! let handle = subscribe(&store, selectors)?;
//! println!("now: {:?}", handle.initial);
//!
//! loop {
//!     match handle.recv() {
//!         Ok(StoreEvent::Changed { values, .. }) => println!("changed: {:?}", values),
//!         Ok(StoreEvent::Dropped { reason }) => break,
//!         Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::{Listener, SubscriptionManager};
pub use types::{
    DropReason, StoreEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
    DEFAULT_BUFFER_SIZE,
};
