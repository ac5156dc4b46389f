//! Core types for the state store.

use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Tag naming an intended state change (e.g. `"SET_USER"`).
///
/// Tags are unique within the reducer that understands them. A reducer
/// ignores every tag outside its own set.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionKind(Cow<'static, str>);

impl ActionKind {
    /// Tag from a string known at compile time.
    pub const fn from_static(kind: &'static str) -> Self {
        ActionKind(Cow::Borrowed(kind))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ActionKind {
    fn from(kind: &'static str) -> Self {
        ActionKind(Cow::Borrowed(kind))
    }
}

impl From<String> for ActionKind {
    fn from(kind: String) -> Self {
        ActionKind(Cow::Owned(kind))
    }
}

impl PartialEq<str> for ActionKind {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ActionKind {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionKind({})", self.0)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tagged description of an intended state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Which change is requested.
    pub kind: ActionKind,

    /// Optional data the reducer needs to apply the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    /// Create an action without a payload.
    pub fn new(kind: impl Into<ActionKind>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    /// Create an action carrying a JSON payload.
    pub fn with_payload(kind: impl Into<ActionKind>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }

    /// Create an action by serializing any payload value.
    pub fn json(kind: impl Into<ActionKind>, payload: &impl Serialize) -> Result<Self> {
        Ok(Self::with_payload(kind, serde_json::to_value(payload)?))
    }

    /// Decode the payload. An absent payload decodes as JSON `null`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.payload.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    /// Check the tag.
    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_str() == kind
    }
}

/// Snapshot generation. Bumped only when a dispatch changes some slice.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Version(pub u64);

impl Version {
    pub fn next(self) -> Self {
        Version(self.0 + 1)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique identifier of a store instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(pub u64);

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreId({})", self.0)
    }
}

/// Identifier returned by [`Store::listen`](crate::Store::listen).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Store statistics.
#[derive(Clone, Debug, Default)]
pub struct StoreStats {
    pub version: Version,
    pub root_keys: usize,
    pub dispatched: u64,
    pub unhandled: u64,
    pub listeners: usize,
    pub subscriptions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_next() {
        assert_eq!(Version(0).next(), Version(1));
        assert_eq!(Version::default(), Version(0));
    }

    #[test]
    fn test_action_kind_compare() {
        let kind = ActionKind::from("SET_USER");
        assert_eq!(kind, "SET_USER");
        assert_eq!(kind, ActionKind::from("SET_USER".to_string()));
        assert_eq!(kind.to_string(), "SET_USER");
    }

    #[test]
    fn test_action_payload_decode() {
        let action = Action::with_payload("SET_COUNT", json!(7));
        let count: u32 = action.payload_as().unwrap();
        assert_eq!(count, 7);

        let bare = Action::new("RESET");
        let nothing: Option<u32> = bare.payload_as().unwrap();
        assert_eq!(nothing, None);

        let wrong: Result<String> = action.payload_as();
        assert!(matches!(wrong, Err(StoreError::Deserialization(_))));
    }

    #[test]
    fn test_action_serde_shape() {
        let action = Action::new("PING");
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, json!({"kind": "PING"}));

        let parsed: Action =
            serde_json::from_value(json!({"kind": "SET_COUNT", "payload": 3})).unwrap();
        assert!(parsed.is("SET_COUNT"));
        assert_eq!(parsed.payload, Some(json!(3)));
    }
}
