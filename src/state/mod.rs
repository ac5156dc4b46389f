//! State snapshots and the reducers that advance them.
//!
//! A snapshot maps root keys to independently owned slices. Each root key
//! has exactly one reducer; a dispatch runs every reducer and rebuilds the
//! root only when at least one slice changed.

mod reducer;
mod snapshot;

pub(crate) use reducer::{ErasedReducer, ReducerBox};
pub(crate) use snapshot::same_slice;
pub use reducer::{reducer_fn, FnReducer, Reducer};
pub use snapshot::{Slice, SliceRef, SliceValue, Snapshot};
