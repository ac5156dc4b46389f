//! Selectors derive read-only views from a snapshot.
//!
//! Each selector is a pure function of the whole [`Snapshot`]. A
//! [`SelectorMap`] names a set of them; composing the map gives one
//! function that evaluates all of them and returns a single
//! [`DerivedValues`] object keyed by selector name, so a subscriber reads
//! everything it needs in one call.

use crate::error::{Result, StoreError};
use crate::state::Snapshot;
use lru::LruCache;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of snapshots a [`MemoizedSelector`] remembers.
pub const DEFAULT_SELECTOR_CACHE_SIZE: usize = 16;

/// An erased selector returning JSON.
pub type SelectorFn = Arc<dyn Fn(&Snapshot) -> Result<Value> + Send + Sync>;

/// Named selectors, kept in insertion order.
#[derive(Clone, Default)]
pub struct SelectorMap {
    entries: Vec<(String, SelectorFn)>,
}

impl SelectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selector, builder style.
    pub fn with<T, F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&Snapshot) -> T + Send + Sync + 'static,
        T: Serialize,
    {
        self.insert(name, selector);
        self
    }

    /// Add a selector. A selector with the same name is replaced.
    pub fn insert<T, F>(&mut self, name: impl Into<String>, selector: F)
    where
        F: Fn(&Snapshot) -> T + Send + Sync + 'static,
        T: Serialize,
    {
        let erased: SelectorFn = Arc::new(move |snapshot: &Snapshot| {
            serde_json::to_value(selector(snapshot))
                .map_err(|e| StoreError::Serialization(e.to_string()))
        });
        self.insert_erased(name.into(), erased);
    }

    /// Merge another map into this one. Later names win.
    pub fn extend(&mut self, other: SelectorMap) {
        for (name, selector) in other.entries {
            self.insert_erased(name, selector);
        }
    }

    fn insert_erased(&mut self, name: String, selector: SelectorFn) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = selector,
            None => self.entries.push((name, selector)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluate a single selector by name.
    pub fn select(&self, name: &str, snapshot: &Snapshot) -> Result<Value> {
        let (_, selector) = self
            .entries
            .iter()
            .find(|(existing, _)| existing == name)
            .ok_or_else(|| StoreError::UnknownSelector(name.to_string()))?;
        selector(snapshot)
    }
}

impl fmt::Debug for SelectorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// All selectors of a map folded into one function.
#[derive(Clone, Debug)]
pub struct ComposedSelector {
    selectors: SelectorMap,
}

/// Compose a selector map into a single selector.
pub fn compose_selectors(selectors: &SelectorMap) -> ComposedSelector {
    ComposedSelector {
        selectors: selectors.clone(),
    }
}

impl ComposedSelector {
    /// Run every selector against `snapshot`.
    ///
    /// Two evaluations against the same snapshot produce equal values.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Result<DerivedValues> {
        let mut values = Map::new();
        for (name, selector) in &self.selectors.entries {
            values.insert(name.clone(), selector(snapshot)?);
        }
        Ok(DerivedValues(values))
    }

    /// Evaluate and decode straight into a typed view.
    pub fn evaluate_as<T: DeserializeOwned>(&self, snapshot: &Snapshot) -> Result<T> {
        self.evaluate(snapshot)?.into_typed()
    }

    pub fn selectors(&self) -> &SelectorMap {
        &self.selectors
    }
}

/// The output of a composed selector, keyed by selector name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedValues(Map<String, Value>);

impl DerivedValues {
    /// Decode one derived value.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self
            .0
            .get(name)
            .ok_or_else(|| StoreError::UnknownSelector(name.to_string()))?;
        T::deserialize(value).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Decode all values into one struct whose fields are the selector names.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// A composed selector that remembers its results per snapshot.
///
/// Entries hold a clone of the snapshot they were computed from, so a
/// cached snapshot address cannot be reused by a different snapshot.
pub struct MemoizedSelector {
    selector: ComposedSelector,
    cache: Mutex<LruCache<usize, (Snapshot, DerivedValues)>>,
}

impl MemoizedSelector {
    pub fn new(selector: ComposedSelector) -> Self {
        Self::with_capacity(selector, DEFAULT_SELECTOR_CACHE_SIZE)
    }

    pub fn with_capacity(selector: ComposedSelector, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            selector,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Evaluate, reusing the cached result for a snapshot seen before.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Result<DerivedValues> {
        let key = snapshot.identity();
        if let Some((_, values)) = self.cache.lock().get(&key) {
            tracing::trace!(version = %snapshot.version(), "selector cache hit");
            return Ok(values.clone());
        }

        let values = self.selector.evaluate(snapshot)?;
        self.cache
            .lock()
            .put(key, (snapshot.clone(), values.clone()));
        Ok(values)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}

impl fmt::Debug for MemoizedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizedSelector")
            .field("selector", &self.selector)
            .field("cached", &self.cached_len())
            .finish()
    }
}
