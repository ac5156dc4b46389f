//! # Duck Store
//!
//! A unidirectional state store in the "ducks" style: typed actions flow
//! through pure reducers into immutable snapshots, and selectors derive
//! read-only views for subscribers.
//!
//! ## Core Concepts
//!
//! - **Actions**: a tag plus an optional JSON payload describing a change
//! - **Reducers**: pure functions from (previous slice, action) to next slice
//! - **Snapshots**: immutable state trees sharing untouched slices
//! - **Selectors**: pure functions deriving views, composed by name
//! - **Ducks**: one module per sub-state bundling all of the above
//!
//! ## Example
//!
//! ```ignore
//! use duckstore::app::create_app_store;
//! use duckstore::ducks::user::{self, User};
//! use duckstore::StoreConfig;
//!
//! let store = create_app_store(StoreConfig::default())?;
//!
//! store.dispatch(user::set_user(User::new("King Jenkins", "King")));
//! store.dispatch(user::set_username("Ada"));
//!
//! let view = user::select_user(&store.get_state())?;
//! assert_eq!(view.username, "Ada");
//! ```

pub mod app;
pub mod bind;
pub mod ducks;
pub mod error;
pub mod middleware;
pub mod selectors;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use app::{create_app_store, AppState};
pub use bind::{bind_action, bind_actions, ActionCreator, ActionCreatorSet, BoundAction};
pub use error::{Result, StoreError};
pub use middleware::{ActionLogger, Flow, Middleware};
pub use selectors::{
    compose_selectors, ComposedSelector, DerivedValues, MemoizedSelector, SelectorMap,
};
pub use state::{reducer_fn, FnReducer, Reducer, Slice, SliceValue, Snapshot};
pub use store::{
    create_store, subscribe, ReducerMap, Store, StoreBuilder, StoreConfig, WeakStore,
};
pub use subscriptions::{
    DropReason, StoreEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
    SubscriptionManager,
};
pub use types::*;
