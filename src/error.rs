//! Error types for the state store.

use thiserror::Error;

/// Main error type for store operations.
///
/// Dispatching never fails: an action nobody understands is a no-op.
/// Errors are raised while building a store, decoding slices or
/// evaluating selectors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store has no reducers")]
    NoReducers,

    #[error("Root key registered twice: {0}")]
    DuplicateRootKey(String),

    #[error("Root key has no reducer: {0}")]
    UnknownRootKey(String),

    #[error("Preloaded state must be a JSON object, got {0}")]
    InvalidPreloadedState(String),

    #[error("Slice type mismatch for {key}: expected {expected}")]
    SliceTypeMismatch { key: String, expected: &'static str },

    #[error("Selector not found: {0}")]
    UnknownSelector(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Subscription was dropped")]
    SubscriptionDropped,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
