//! Immutable state snapshots.

use crate::error::{Result, StoreError};
use crate::types::Version;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::{self, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value that can live under a root key of a [`Snapshot`].
pub trait Slice:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Slice for T where
    T: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Type-erased view of a [`Slice`].
pub trait SliceValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn to_json(&self) -> Result<Value>;

    fn type_name(&self) -> &'static str;

    /// Deep equality against another erased slice.
    fn eq_slice(&self, other: &dyn SliceValue) -> bool;
}

impl<T: Slice> SliceValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn eq_slice(&self, other: &dyn SliceValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

/// Shared pointer to an erased slice.
pub type SliceRef = Arc<dyn SliceValue>;

/// Pointer identity for erased slices (ignores vtable metadata).
pub(crate) fn same_slice(a: &SliceRef, b: &SliceRef) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

struct SnapshotInner {
    version: Version,
    slices: BTreeMap<String, SliceRef>,
}

/// The full application state at one point in time.
///
/// A snapshot is never mutated. Each state change produces a new snapshot
/// that shares every untouched slice with its predecessor, so cloning a
/// snapshot and comparing slices by identity are both O(1).
#[derive(Clone)]
pub struct Snapshot {
    inner: Arc<SnapshotInner>,
}

impl Snapshot {
    pub(crate) fn new(version: Version, slices: BTreeMap<String, SliceRef>) -> Self {
        Self {
            inner: Arc::new(SnapshotInner { version, slices }),
        }
    }

    /// Generation of this snapshot.
    pub fn version(&self) -> Version {
        self.inner.version
    }

    /// Root keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.slices.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.slices.contains_key(key)
    }

    /// Borrow the slice under `key` as its concrete type.
    ///
    /// Returns `None` if the key is absent or holds another type.
    pub fn slice<S: Slice>(&self, key: &str) -> Option<&S> {
        self.inner
            .slices
            .get(key)
            .and_then(|slice| slice.as_ref().as_any().downcast_ref::<S>())
    }

    /// Like [`slice`](Self::slice) but reports why the lookup failed.
    pub fn try_slice<S: Slice>(&self, key: &str) -> Result<&S> {
        let slice = self
            .inner
            .slices
            .get(key)
            .ok_or_else(|| StoreError::UnknownRootKey(key.to_string()))?;

        slice
            .as_ref()
            .as_any()
            .downcast_ref::<S>()
            .ok_or_else(|| StoreError::SliceTypeMismatch {
                key: key.to_string(),
                expected: any::type_name::<S>(),
            })
    }

    /// Shared handle to the slice under `key`.
    pub fn slice_arc<S: Slice>(&self, key: &str) -> Option<Arc<S>> {
        let slice = Arc::clone(self.inner.slices.get(key)?);
        slice.into_any().downcast::<S>().ok()
    }

    /// The erased slice under `key`.
    pub fn raw(&self, key: &str) -> Option<&SliceRef> {
        self.inner.slices.get(key)
    }

    /// True if both snapshots are the same allocation.
    pub fn ptr_eq(a: &Snapshot, b: &Snapshot) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// True if `key` holds the very same slice allocation in both snapshots.
    pub fn shares_slice(&self, other: &Snapshot, key: &str) -> bool {
        match (self.raw(key), other.raw(key)) {
            (Some(a), Some(b)) => same_slice(a, b),
            _ => false,
        }
    }

    /// Serialize the whole state tree as a JSON object keyed by root key.
    pub fn to_json(&self) -> Result<Value> {
        let mut root = serde_json::Map::new();
        for (key, slice) in &self.inner.slices {
            root.insert(key.clone(), slice.to_json()?);
        }
        Ok(Value::Object(root))
    }

    /// Address of the shared root; stable while any clone is alive.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for Snapshot {
    /// Deep equality of the state trees. Versions are not compared.
    fn eq(&self, other: &Self) -> bool {
        if Snapshot::ptr_eq(self, other) {
            return true;
        }

        let ours = &self.inner.slices;
        let theirs = &other.inner.slices;
        ours.len() == theirs.len()
            && ours.iter().all(|(key, slice)| {
                theirs
                    .get(key)
                    .map_or(false, |other| slice.eq_slice(other.as_ref()))
            })
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("version", &self.inner.version)
            .field("slices", &self.inner.slices)
            .finish()
    }
}
