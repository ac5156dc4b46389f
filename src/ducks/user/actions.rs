//! User action kinds and creators.

use crate::bind::{bind_action, ActionCreator, ActionCreatorSet, BoundAction};
use crate::store::Store;
use crate::types::{Action, ActionKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A user as shown in the app header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            title: Some(title.into()),
        }
    }
}

impl From<&User> for Value {
    fn from(user: &User) -> Self {
        let mut map = Map::new();
        if let Some(username) = &user.username {
            map.insert("username".to_string(), Value::String(username.clone()));
        }
        if let Some(title) = &user.title {
            map.insert("title".to_string(), Value::String(title.clone()));
        }
        Value::Object(map)
    }
}

/// The closed set of actions the user reducer understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UserActionKind {
    /// Replace the whole user.
    SetUser,
    /// Replace only the username.
    SetUserUsername,
}

impl UserActionKind {
    pub const ALL: [UserActionKind; 2] = [UserActionKind::SetUser, UserActionKind::SetUserUsername];

    /// Wire names, in the same order as [`ALL`](Self::ALL).
    pub const NAMES: [&'static str; 2] = {
        let mut names = [""; 2];
        let mut i = 0;
        while i < Self::ALL.len() {
            names[i] = Self::ALL[i].as_str();
            i += 1;
        }
        names
    };

    pub const fn as_str(self) -> &'static str {
        match self {
            UserActionKind::SetUser => "SET_USER",
            UserActionKind::SetUserUsername => "SET_USER_USERNAME",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == kind)
    }
}

impl From<UserActionKind> for ActionKind {
    fn from(kind: UserActionKind) -> Self {
        ActionKind::from_static(kind.as_str())
    }
}

impl fmt::Display for UserActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `SET_USER`: replace the whole user.
pub fn set_user(user: User) -> Action {
    Action::with_payload(UserActionKind::SetUser, Value::from(&user))
}

/// `SET_USER_USERNAME`: replace the username, keep everything else.
pub fn set_username(username: impl Into<String>) -> Action {
    Action::with_payload(
        UserActionKind::SetUserUsername,
        Value::String(username.into()),
    )
}

fn set_username_owned(username: String) -> Action {
    set_username(username)
}

pub const SET_USER: ActionCreator<User> = ActionCreator::new("set_user", set_user);

pub const SET_USERNAME: ActionCreator<String> =
    ActionCreator::new("set_username", set_username_owned);

/// Creator set of the user duck.
#[derive(Clone, Copy, Debug, Default)]
pub struct UserActions;

/// User creators bound to a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoundUserActions {
    pub set_user: BoundAction<User>,
    pub set_username: BoundAction<String>,
}

impl ActionCreatorSet for UserActions {
    type Bound = BoundUserActions;

    fn bind(store: &Store) -> BoundUserActions {
        BoundUserActions {
            set_user: bind_action(SET_USER, store),
            set_username: bind_action(SET_USERNAME, store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_line_up() {
        assert_eq!(UserActionKind::NAMES, ["SET_USER", "SET_USER_USERNAME"]);
        for (kind, name) in UserActionKind::ALL.iter().zip(UserActionKind::NAMES) {
            assert_eq!(kind.as_str(), name);
            assert_eq!(UserActionKind::parse(name), Some(*kind));
        }
        assert_eq!(UserActionKind::parse("SET_USER_TITLE"), None);
    }

    #[test]
    fn test_set_user_payload() {
        let action = set_user(User::new("King Jenkins", "King"));
        assert!(action.is("SET_USER"));
        assert_eq!(
            action.payload,
            Some(json!({"username": "King Jenkins", "title": "King"}))
        );
    }

    #[test]
    fn test_set_user_omits_missing_fields() {
        let action = set_user(User {
            username: Some("Ada".into()),
            title: None,
        });
        assert_eq!(action.payload, Some(json!({"username": "Ada"})));
    }

    #[test]
    fn test_set_username_payload() {
        let action = set_username("Ada");
        assert!(action.is("SET_USER_USERNAME"));
        assert_eq!(action.payload, Some(json!("Ada")));
        assert_eq!(SET_USERNAME.create("Ada".to_string()), action);
    }

    #[test]
    fn test_user_serde_matches_value_from() {
        let user = User::new("a", "b");
        assert_eq!(serde_json::to_value(&user).unwrap(), Value::from(&user));
    }
}
