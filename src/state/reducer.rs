//! Reducers: pure transitions from one slice to the next.

use crate::error::{Result, StoreError};
use crate::types::Action;
use serde_json::Value;
use std::any;
use std::sync::Arc;

use super::snapshot::{Slice, SliceRef};

/// Computes the next slice from the previous slice and an action.
///
/// Implementations must be pure and total:
/// - never mutate `previous`;
/// - return `Arc::clone(previous)` for any action whose kind is not in
///   [`action_kinds`](Reducer::action_kinds), so subscribers can detect
///   "no change" by pointer identity.
pub trait Reducer: Send + Sync + 'static {
    type Slice: Slice;

    /// Value of the slice before any action is applied.
    fn initial_state(&self) -> Self::Slice;

    /// The closed set of action kinds this reducer understands.
    fn action_kinds(&self) -> &'static [&'static str];

    fn reduce(&self, previous: &Arc<Self::Slice>, action: &Action) -> Arc<Self::Slice>;
}

/// Reducer built from a closure.
pub struct FnReducer<S, F> {
    initial: S,
    kinds: &'static [&'static str],
    reduce: F,
}

/// Build a reducer from an initial value, its action kinds and a closure.
pub fn reducer_fn<S, F>(initial: S, kinds: &'static [&'static str], reduce: F) -> FnReducer<S, F>
where
    S: Slice,
    F: Fn(&Arc<S>, &Action) -> Arc<S> + Send + Sync + 'static,
{
    FnReducer {
        initial,
        kinds,
        reduce,
    }
}

impl<S, F> Reducer for FnReducer<S, F>
where
    S: Slice,
    F: Fn(&Arc<S>, &Action) -> Arc<S> + Send + Sync + 'static,
{
    type Slice = S;

    fn initial_state(&self) -> S {
        self.initial.clone()
    }

    fn action_kinds(&self) -> &'static [&'static str] {
        self.kinds
    }

    fn reduce(&self, previous: &Arc<S>, action: &Action) -> Arc<S> {
        (self.reduce)(previous, action)
    }
}

/// Object-safe reducer over erased slices, stored per root key.
pub(crate) trait ErasedReducer: Send + Sync {
    fn initial(&self) -> SliceRef;

    /// Decode a preloaded JSON value into this reducer's slice type.
    fn hydrate(&self, value: Value) -> Result<SliceRef>;

    fn handles(&self, kind: &str) -> bool;

    fn reduce(&self, key: &str, previous: &SliceRef, action: &Action) -> Result<SliceRef>;
}

pub(crate) struct ReducerBox<R> {
    reducer: R,
}

impl<R: Reducer> ReducerBox<R> {
    pub(crate) fn new(reducer: R) -> Self {
        Self { reducer }
    }
}

impl<R: Reducer> ErasedReducer for ReducerBox<R> {
    fn initial(&self) -> SliceRef {
        Arc::new(self.reducer.initial_state())
    }

    fn hydrate(&self, value: Value) -> Result<SliceRef> {
        let slice: R::Slice = serde_json::from_value(value)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        let slice: SliceRef = Arc::new(slice);
        Ok(slice)
    }

    fn handles(&self, kind: &str) -> bool {
        self.reducer.action_kinds().iter().any(|k| *k == kind)
    }

    fn reduce(&self, key: &str, previous: &SliceRef, action: &Action) -> Result<SliceRef> {
        let typed = Arc::clone(previous)
            .into_any()
            .downcast::<R::Slice>()
            .map_err(|_| StoreError::SliceTypeMismatch {
                key: key.to_string(),
                expected: any::type_name::<R::Slice>(),
            })?;

        let next = self.reducer.reduce(&typed, action);
        if Arc::ptr_eq(&next, &typed) {
            // Hand back the caller's pointer so identity survives erasure.
            return Ok(Arc::clone(previous));
        }
        let next: SliceRef = next;
        Ok(next)
    }
}
