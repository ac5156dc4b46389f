//! The application store: every duck under its root key.

use crate::ducks::user::{UserReducer, UserState, USER_KEY};
use crate::error::Result;
use crate::middleware::ActionLogger;
use crate::state::Snapshot;
use crate::store::{ReducerMap, Store, StoreConfig};
use serde::{Deserialize, Serialize};

/// Typed view of the whole application state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub user: UserState,
}

impl AppState {
    /// Copy the slices of `snapshot` into a typed value.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        Ok(Self {
            user: snapshot.try_slice::<UserState>(USER_KEY)?.clone(),
        })
    }
}

/// Root key → reducer mapping of the application.
pub fn app_reducers() -> ReducerMap {
    ReducerMap::new().with(USER_KEY, UserReducer)
}

/// Build the application store with action logging enabled.
pub fn create_app_store(config: StoreConfig) -> Result<Store> {
    Store::builder(config)
        .reducers(app_reducers())
        .middleware(ActionLogger)
        .build()
}
