//! Main Store struct tying all components together.

use crate::error::{Result, StoreError};
use crate::middleware::{Flow, Middleware};
use crate::selectors::{
    compose_selectors, MemoizedSelector, SelectorMap, DEFAULT_SELECTOR_CACHE_SIZE,
};
use crate::state::{same_slice, ErasedReducer, Reducer, ReducerBox, SliceRef, Snapshot};
use crate::subscriptions::{
    Listener, SubscriptionConfig, SubscriptionHandle, SubscriptionId, SubscriptionManager,
    DEFAULT_BUFFER_SIZE,
};
use crate::types::{Action, ListenerId, StoreId, StoreStats, Version};
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Log a warning when no reducer understands a dispatched action.
    /// Default: on in debug builds.
    pub warn_on_unhandled_actions: bool,

    /// Buffer size used by [`Store::subscribe_selectors`].
    /// Default: 1000
    pub subscription_buffer_size: usize,

    /// Capacity of memoized selectors created by the store.
    /// Default: 16
    pub selector_cache_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            warn_on_unhandled_actions: cfg!(debug_assertions),
            subscription_buffer_size: DEFAULT_BUFFER_SIZE,
            selector_cache_size: DEFAULT_SELECTOR_CACHE_SIZE,
        }
    }
}

/// Root key → reducer mapping used to build a store.
#[derive(Default)]
pub struct ReducerMap {
    entries: Vec<(String, Box<dyn ErasedReducer>)>,
}

impl ReducerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reducer under `key`, builder style.
    pub fn with<R: Reducer>(mut self, key: impl Into<String>, reducer: R) -> Self {
        self.insert(key, reducer);
        self
    }

    /// Add a reducer under `key`. Duplicates are reported by the builder.
    pub fn insert<R: Reducer>(&mut self, key: impl Into<String>, reducer: R) {
        let reducer: Box<dyn ErasedReducer> = Box::new(ReducerBox::new(reducer));
        self.entries.push((key.into(), reducer));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ReducerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

/// Builds a [`Store`], checking the root keys up front.
pub struct StoreBuilder {
    config: StoreConfig,
    reducers: ReducerMap,
    middleware: Vec<Box<dyn Middleware>>,
    preloaded: Option<Value>,
}

impl StoreBuilder {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            reducers: ReducerMap::new(),
            middleware: Vec::new(),
            preloaded: None,
        }
    }

    pub fn reducer<R: Reducer>(mut self, key: impl Into<String>, reducer: R) -> Self {
        self.reducers.insert(key, reducer);
        self
    }

    pub fn reducers(mut self, reducers: ReducerMap) -> Self {
        self.reducers.entries.extend(reducers.entries);
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn middlewares(mut self, middleware: Vec<Box<dyn Middleware>>) -> Self {
        self.middleware.extend(middleware);
        self
    }

    /// Start from this state instead of the reducers' initial values.
    ///
    /// Must be a JSON object whose keys are a subset of the reducer keys.
    /// Keys left out start from their reducer's initial state.
    pub fn preloaded_state(mut self, state: Value) -> Self {
        self.preloaded = Some(state);
        self
    }

    pub fn build(self) -> Result<Store> {
        if self.reducers.is_empty() {
            return Err(StoreError::NoReducers);
        }

        let mut reducers: BTreeMap<String, Box<dyn ErasedReducer>> = BTreeMap::new();
        for (key, reducer) in self.reducers.entries {
            if reducers.contains_key(&key) {
                return Err(StoreError::DuplicateRootKey(key));
            }
            reducers.insert(key, reducer);
        }

        let mut preloaded = match self.preloaded {
            None => serde_json::Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(StoreError::InvalidPreloadedState(json_kind(&other))),
        };
        if let Some(unknown) = preloaded.keys().find(|key| !reducers.contains_key(*key)) {
            return Err(StoreError::UnknownRootKey(unknown.clone()));
        }

        let mut slices: BTreeMap<String, SliceRef> = BTreeMap::new();
        for (key, reducer) in &reducers {
            let slice = match preloaded.remove(key) {
                Some(value) => reducer.hydrate(value)?,
                None => reducer.initial(),
            };
            slices.insert(key.clone(), slice);
        }

        let id = StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::SeqCst));
        tracing::debug!(
            store = id.0,
            root_keys = ?reducers.keys().collect::<Vec<_>>(),
            middleware = self.middleware.len(),
            "store created"
        );

        Ok(Store {
            inner: Arc::new(StoreInner {
                id,
                config: self.config,
                reducers,
                middleware: self.middleware,
                current: RwLock::new(Snapshot::new(Version::default(), slices)),
                dispatch_lock: ReentrantMutex::new(()),
                subscriptions: SubscriptionManager::new(),
                dispatched: AtomicU64::new(0),
                unhandled: AtomicU64::new(0),
            }),
        })
    }
}

fn json_kind(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
    .to_string()
}

/// Create a store from a reducer mapping and optional middleware.
pub fn create_store(reducers: ReducerMap, middleware: Vec<Box<dyn Middleware>>) -> Result<Store> {
    Store::builder(StoreConfig::default())
        .reducers(reducers)
        .middlewares(middleware)
        .build()
}

struct StoreInner {
    id: StoreId,

    config: StoreConfig,

    /// One reducer per root key, sorted by key.
    reducers: BTreeMap<String, Box<dyn ErasedReducer>>,

    middleware: Vec<Box<dyn Middleware>>,

    /// The current snapshot. Replaced, never mutated.
    current: RwLock<Snapshot>,

    /// Serializes dispatches. Re-entrant so listeners, middleware and
    /// thunks can dispatch on the thread that holds it.
    dispatch_lock: ReentrantMutex<()>,

    subscriptions: SubscriptionManager,

    dispatched: AtomicU64,
    unhandled: AtomicU64,
}

/// The state store.
///
/// Holds one immutable [`Snapshot`], applies actions through the reducers
/// synchronously and notifies subscribers before `dispatch` returns.
/// `Store` is a cheap handle: clones share the same state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn builder(config: StoreConfig) -> StoreBuilder {
        StoreBuilder::new(config)
    }

    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    /// A handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The current snapshot. O(1), no side effects.
    pub fn get_state(&self) -> Snapshot {
        self.inner.current.read().clone()
    }

    pub fn version(&self) -> Version {
        self.inner.current.read().version()
    }

    pub fn root_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.reducers.keys().map(String::as_str)
    }

    // --- Dispatch ---

    /// Apply an action and notify subscribers.
    ///
    /// Runs the middleware chain, then every root reducer. An action no
    /// reducer understands leaves the state untouched.
    pub fn dispatch(&self, action: Action) {
        let _lock = self.inner.dispatch_lock.lock();
        self.inner.dispatched.fetch_add(1, Ordering::Relaxed);

        for middleware in &self.inner.middleware {
            if middleware.handle(self, &action) == Flow::Consume {
                tracing::trace!(kind = %action.kind, "action consumed by middleware");
                return;
            }
        }

        self.apply(&action);
    }

    /// Run a closure with exclusive dispatch access.
    ///
    /// The closure may read state and dispatch any number of actions; other
    /// threads cannot dispatch in between.
    pub fn dispatch_thunk<R>(&self, thunk: impl FnOnce(&Store) -> R) -> R {
        let _lock = self.inner.dispatch_lock.lock();
        thunk(self)
    }

    fn apply(&self, action: &Action) {
        let previous = self.get_state();

        let handled = self
            .inner
            .reducers
            .values()
            .any(|reducer| reducer.handles(action.kind.as_str()));
        if !handled {
            self.inner.unhandled.fetch_add(1, Ordering::Relaxed);
            if self.inner.config.warn_on_unhandled_actions {
                tracing::warn!(kind = %action.kind, "no reducer handles action");
            }
        }

        let mut changed = false;
        let mut slices: BTreeMap<String, SliceRef> = BTreeMap::new();
        for (key, reducer) in &self.inner.reducers {
            let Some(before) = previous.raw(key) else {
                tracing::error!(key = %key, "root key missing from snapshot");
                continue;
            };
            let after = match reducer.reduce(key, before, action) {
                Ok(after) => after,
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "reducer failed, keeping slice");
                    Arc::clone(before)
                }
            };
            changed |= !same_slice(before, &after);
            slices.insert(key.clone(), after);
        }

        if !changed {
            tracing::trace!(kind = %action.kind, version = %previous.version(), "no change");
            return;
        }

        let next = Snapshot::new(previous.version().next(), slices);
        *self.inner.current.write() = next.clone();
        tracing::trace!(kind = %action.kind, version = %next.version(), "state replaced");

        // A listener may dispatch; that nested dispatch already notified
        // everyone of the newer snapshot, so stop handing out this one.
        let is_current = || Snapshot::ptr_eq(&next, &self.inner.current.read());
        let subscriptions = &self.inner.subscriptions;
        if subscriptions.notify_listeners(&next, is_current) && is_current() {
            subscriptions.broadcast(&next);
        }
    }

    // --- Subscriptions ---

    /// Run `listener` after every snapshot change. Returns an id for
    /// [`unlisten`](Self::unlisten).
    ///
    /// The store owns its listeners. A listener that captures a `Store`
    /// clone keeps the store alive forever; capture a [`WeakStore`] from
    /// [`downgrade`](Self::downgrade) instead.
    pub fn listen(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) -> ListenerId {
        let listener: Listener = Arc::new(listener);
        self.inner.subscriptions.listen(listener)
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.inner.subscriptions.unlisten(id)
    }

    /// Watch a selector map; see [`SubscriptionManager::subscribe`].
    pub fn subscribe(&self, config: SubscriptionConfig) -> Result<SubscriptionHandle> {
        // Hold the dispatch lock so no change slips in between evaluating
        // the initial values and registering.
        let _lock = self.inner.dispatch_lock.lock();
        self.inner.subscriptions.subscribe(config, &self.get_state())
    }

    /// Watch a selector map with the store's configured buffer size.
    pub fn subscribe_selectors(&self, selectors: SelectorMap) -> Result<SubscriptionHandle> {
        self.subscribe(SubscriptionConfig {
            buffer_size: self.inner.config.subscription_buffer_size,
            selectors,
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscriptions.unsubscribe(id)
    }

    /// Compose `selectors` behind a cache sized by the store config.
    pub fn memoized(&self, selectors: &SelectorMap) -> MemoizedSelector {
        MemoizedSelector::with_capacity(
            compose_selectors(selectors),
            self.inner.config.selector_cache_size,
        )
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            version: self.version(),
            root_keys: self.inner.reducers.len(),
            dispatched: self.inner.dispatched.load(Ordering::Relaxed),
            unhandled: self.inner.unhandled.load(Ordering::Relaxed),
            listeners: self.inner.subscriptions.listener_count(),
            subscriptions: self.inner.subscriptions.subscription_count(),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("version", &self.version())
            .field("root_keys", &self.root_keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Non-owning store handle, for callbacks the store itself holds.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    /// The store, if any strong handle is still alive.
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Watch `selectors` on `store`, returning the handle with the current
/// derived values in [`SubscriptionHandle::initial`].
pub fn subscribe(store: &Store, selectors: SelectorMap) -> Result<SubscriptionHandle> {
    store.subscribe_selectors(selectors)
}
