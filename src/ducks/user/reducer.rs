//! User reducer.

use crate::state::Reducer;
use crate::types::Action;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::actions::{User, UserActionKind};

/// Root key the user slice lives under.
pub const USER_KEY: &str = "user";

pub const DEFAULT_USERNAME: &str = "Unknown";
pub const DEFAULT_TITLE: &str = "Jobless";

/// The user slice of the app state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub user: User,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            user: User::new(DEFAULT_USERNAME, DEFAULT_TITLE),
        }
    }
}

/// Applies [`UserActionKind`] actions to a [`UserState`].
///
/// | kind                | effect                                   |
/// |---------------------|------------------------------------------|
/// | `SET_USER`          | user replaced wholesale by the payload   |
/// | `SET_USER_USERNAME` | username replaced, title left untouched  |
/// | anything else       | previous slice returned as is            |
///
/// A payload of the wrong shape is logged and ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct UserReducer;

impl Reducer for UserReducer {
    type Slice = UserState;

    fn initial_state(&self) -> UserState {
        UserState::default()
    }

    fn action_kinds(&self) -> &'static [&'static str] {
        &UserActionKind::NAMES
    }

    fn reduce(&self, previous: &Arc<UserState>, action: &Action) -> Arc<UserState> {
        let Some(kind) = UserActionKind::parse(action.kind.as_str()) else {
            return Arc::clone(previous);
        };

        match kind {
            UserActionKind::SetUser => match action.payload_as::<Option<User>>() {
                Ok(user) => Arc::new(UserState {
                    user: user.unwrap_or_default(),
                }),
                Err(e) => {
                    tracing::warn!(%kind, error = %e, "ignoring malformed payload");
                    Arc::clone(previous)
                }
            },
            UserActionKind::SetUserUsername => match action.payload_as::<Option<String>>() {
                Ok(username) => Arc::new(UserState {
                    user: User {
                        username,
                        ..previous.user.clone()
                    },
                }),
                Err(e) => {
                    tracing::warn!(%kind, error = %e, "ignoring malformed payload");
                    Arc::clone(previous)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ducks::user::actions::{set_user, set_username};
    use serde_json::json;

    fn initial() -> Arc<UserState> {
        Arc::new(UserReducer.initial_state())
    }

    #[test]
    fn test_initial_state() {
        assert_eq!(
            serde_json::to_value(&*initial()).unwrap(),
            json!({"user": {"username": "Unknown", "title": "Jobless"}})
        );
    }

    #[test]
    fn test_set_user_replaces_without_merge() {
        let state = UserReducer.reduce(
            &initial(),
            &set_user(User {
                username: Some("Ada".into()),
                title: None,
            }),
        );
        assert_eq!(state.user.username.as_deref(), Some("Ada"));
        assert_eq!(state.user.title, None);
    }

    #[test]
    fn test_set_username_keeps_title() {
        let state = UserReducer.reduce(&initial(), &set_username("Ada"));
        assert_eq!(state.user, User::new("Ada", "Jobless"));
    }

    #[test]
    fn test_unknown_action_returns_same_arc() {
        let before = initial();
        let after = UserReducer.reduce(&before, &Action::new("SET_USER_TITLE"));
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        let before = initial();
        let action = Action::with_payload("SET_USER_USERNAME", json!({"name": "Ada"}));
        let after = UserReducer.reduce(&before, &action);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_missing_payloads() {
        let state = UserReducer.reduce(&initial(), &Action::new("SET_USERNAME_NOPE"));
        assert_eq!(*state, UserState::default());

        let cleared = UserReducer.reduce(&initial(), &Action::new("SET_USER_USERNAME"));
        assert_eq!(cleared.user.username, None);
        assert_eq!(cleared.user.title.as_deref(), Some("Jobless"));

        let emptied = UserReducer.reduce(&initial(), &Action::new("SET_USER"));
        assert_eq!(emptied.user, User::default());
    }
}
