//! Middleware run on every dispatched action before the reducers.

use crate::store::Store;
use crate::types::Action;

/// What the store should do with an action after a middleware saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Hand the action to the next middleware, then to the reducers.
    Continue,
    /// Stop here. Later middleware and the reducers never see the action.
    Consume,
}

/// A hook in the dispatch path.
///
/// Middleware runs in registration order while the dispatch lock is held.
/// It may read state and dispatch further actions through `store`; those
/// nested dispatches complete before the outer action reaches the reducers.
pub trait Middleware: Send + Sync {
    fn handle(&self, store: &Store, action: &Action) -> Flow;
}

impl<F> Middleware for F
where
    F: Fn(&Store, &Action) -> Flow + Send + Sync,
{
    fn handle(&self, store: &Store, action: &Action) -> Flow {
        self(store, action)
    }
}

/// Logs every action at `debug` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionLogger;

impl Middleware for ActionLogger {
    fn handle(&self, store: &Store, action: &Action) -> Flow {
        tracing::debug!(
            kind = %action.kind,
            has_payload = action.payload.is_some(),
            version = %store.version(),
            "dispatch"
        );
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ducks::user::set_username;
    use crate::{create_app_store, StoreConfig};

    #[test]
    fn test_action_logger_passes_actions_through() {
        let store = create_app_store(StoreConfig::default()).unwrap();
        assert_eq!(ActionLogger.handle(&store, &set_username("Ada")), Flow::Continue);

        store.dispatch(set_username("Ada"));
        assert_eq!(store.version().0, 1);
    }

    #[test]
    fn test_middleware_runs_in_order() {
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let first = std::sync::Arc::clone(&seen);
        let second = std::sync::Arc::clone(&seen);

        let store = Store::builder(StoreConfig::default())
            .reducers(crate::app::app_reducers())
            .middleware(move |_: &Store, _: &Action| {
                first.lock().push("first");
                Flow::Continue
            })
            .middleware(move |_: &Store, _: &Action| {
                second.lock().push("second");
                Flow::Continue
            })
            .build()
            .unwrap();

        store.dispatch(set_username("Ada"));
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }
}
