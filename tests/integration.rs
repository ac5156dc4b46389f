//! Integration tests for the duck store.

use duckstore::ducks::user::{
    self, set_user, set_username, user_selectors, User, UserActions, UserSelectors, UserState,
    USER_KEY,
};
use duckstore::{
    bind_actions, compose_selectors, create_app_store, subscribe, Action, Snapshot, Store,
    StoreConfig, StoreEvent, Version,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn test_store() -> Store {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    create_app_store(StoreConfig::default()).unwrap()
}

fn current_user(store: &Store) -> User {
    store
        .get_state()
        .slice::<UserState>(USER_KEY)
        .unwrap()
        .user
        .clone()
}

// --- Scenarios ---

#[test]
fn test_initial_snapshot() {
    let store = test_store();
    let state = store.get_state();

    assert_eq!(state.version(), Version(0));
    assert_eq!(
        state.to_json().unwrap(),
        json!({"user": {"user": {"username": "Unknown", "title": "Jobless"}}})
    );
}

#[test]
fn test_set_user_scenario() {
    let store = test_store();
    store.dispatch(set_user(User::new("King Jenkins", "King")));

    assert_eq!(current_user(&store), User::new("King Jenkins", "King"));
}

#[test]
fn test_set_username_scenario() {
    let store = test_store();
    store.dispatch(set_username("Ada"));

    assert_eq!(current_user(&store), User::new("Ada", "Jobless"));
}

#[test]
fn test_composed_user_selectors() {
    let store = test_store();
    store.dispatch(set_username("Ada"));

    let values = compose_selectors(&user_selectors())
        .evaluate(&store.get_state())
        .unwrap();
    assert_eq!(
        values.to_json(),
        json!({"user": {"username": "Ada", "title": "Jobless"}, "username": "Ada"})
    );

    let typed = user::select_user(&store.get_state()).unwrap();
    assert_eq!(
        typed,
        UserSelectors {
            user: User::new("Ada", "Jobless"),
            username: "Ada".to_string(),
        }
    );
}

#[test]
fn test_username_selector_defaults_to_empty() {
    let store = test_store();
    store.dispatch(set_user(User {
        username: None,
        title: Some("Ghost".into()),
    }));

    assert_eq!(user::selectors::username(&store.get_state()), "");
}

// --- Snapshot identity ---

#[test]
fn test_unrecognized_action_keeps_snapshot_identity() {
    let store = test_store();
    let before = store.get_state();

    store.dispatch(Action::new("SET_USER_TITLE"));
    store.dispatch(Action::with_payload("LOGOUT", json!(true)));

    let after = store.get_state();
    assert!(Snapshot::ptr_eq(&before, &after));
    assert_eq!(after.version(), Version(0));
    assert_eq!(store.stats().unhandled, 2);
}

#[test]
fn test_old_snapshots_are_untouched() {
    let store = test_store();
    let before = store.get_state();

    store.dispatch(set_username("Ada"));

    assert_eq!(
        before.slice::<UserState>(USER_KEY).unwrap().user,
        User::new("Unknown", "Jobless")
    );
    assert_eq!(store.get_state().version(), Version(1));
}

#[test]
fn test_repeated_username_is_idempotent() {
    let store = test_store();
    store.dispatch(set_username("x"));
    let once = current_user(&store);
    store.dispatch(set_username("x"));

    assert_eq!(current_user(&store), once);
}

// --- Bound actions ---

#[test]
fn test_bound_user_actions() {
    let store = test_store();
    let actions = bind_actions::<UserActions>(&store);

    actions.set_user.call(User::new("King Jenkins", "King"));
    actions.set_username.call("Ada".to_string());

    assert_eq!(current_user(&store), User::new("Ada", "King"));
}

#[test]
fn test_bound_actions_are_stable() {
    let store = test_store();
    let first = bind_actions::<UserActions>(&store);
    let second = bind_actions::<UserActions>(&store.clone());
    assert_eq!(first, second);

    let other = test_store();
    assert_ne!(first, bind_actions::<UserActions>(&other));
}

// --- Subscriptions ---

#[test]
fn test_subscription_initial_values_and_changes() {
    let store = test_store();
    let handle = subscribe(&store, user_selectors()).unwrap();

    assert_eq!(handle.initial.get::<String>("username").unwrap(), "Unknown");

    store.dispatch(set_username("Ada"));
    match handle.recv_timeout(Duration::from_millis(100)).unwrap() {
        StoreEvent::Changed { version, values } => {
            assert_eq!(version, Version(1));
            assert_eq!(values.get::<String>("username").unwrap(), "Ada");
        }
        other => panic!("Expected Changed event, got {:?}", other),
    }
}

#[test]
fn test_subscription_skips_unchanged_values() {
    let store = test_store();
    let username_only = duckstore::SelectorMap::new().with("username", user::selectors::username);
    let handle = subscribe(&store, username_only).unwrap();

    // Title changes, username does not.
    store.dispatch(set_user(User::new("Unknown", "Duke")));
    assert!(handle.try_recv().is_err());

    store.dispatch(set_username("Ada"));
    assert_eq!(handle.drain().len(), 1);
}

#[test]
fn test_listener_runs_once_per_change() {
    let store = test_store();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = store.listen(move |_: &Snapshot| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.dispatch(set_username("Ada"));
    store.dispatch(Action::new("NOBODY_HANDLES_THIS"));
    store.dispatch(set_username("Grace"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert!(store.unlisten(id));
    store.dispatch(set_username("Linus"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_listener_sees_applied_state() {
    let store = test_store();
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let slot = Arc::clone(&seen);
    store.listen(move |snapshot: &Snapshot| {
        let name = user::selectors::username(snapshot);
        slot.lock().push(name);
    });

    store.dispatch(set_username("Ada"));
    store.dispatch(set_username("Grace"));

    assert_eq!(*seen.lock(), vec!["Ada", "Grace"]);
}

// --- Preloaded state ---

#[test]
fn test_preloaded_state() {
    let store = Store::builder(StoreConfig::default())
        .reducers(duckstore::app::app_reducers())
        .preloaded_state(json!({"user": {"user": {"username": "Ada", "title": "Countess"}}}))
        .build()
        .unwrap();

    assert_eq!(current_user(&store), User::new("Ada", "Countess"));

    store.dispatch(set_username("Grace"));
    assert_eq!(current_user(&store), User::new("Grace", "Countess"));
}

// --- Thunks ---

#[test]
fn test_thunk_reads_and_dispatches() {
    let store = test_store();
    store.dispatch(set_username("ada"));

    store.dispatch_thunk(|store| {
        let name = user::selectors::username(&store.get_state());
        store.dispatch(set_username(name.to_uppercase()));
        store.dispatch(set_user(User::new(format!("{}!", name), "Countess")));
    });

    assert_eq!(current_user(&store), User::new("ada!", "Countess"));
    assert_eq!(store.version(), Version(3));
}
