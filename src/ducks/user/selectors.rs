//! User selectors.

use crate::error::Result;
use crate::selectors::{compose_selectors, SelectorMap};
use crate::state::Snapshot;
use serde::{Deserialize, Serialize};

use super::actions::User;
use super::reducer::{UserState, USER_KEY};

/// The whole user, or `None` if the store has no user slice.
pub fn user(snapshot: &Snapshot) -> Option<User> {
    snapshot
        .slice::<UserState>(USER_KEY)
        .map(|state| state.user.clone())
}

/// The username, or an empty string when unset.
pub fn username(snapshot: &Snapshot) -> String {
    snapshot
        .slice::<UserState>(USER_KEY)
        .and_then(|state| state.user.username.clone())
        .unwrap_or_default()
}

/// Named selectors of the user duck.
pub fn user_selectors() -> SelectorMap {
    SelectorMap::new()
        .with("user", user)
        .with("username", username)
}

/// Typed view over [`user_selectors`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSelectors {
    pub user: User,
    pub username: String,
}

/// Evaluate all user selectors at once.
pub fn select_user(snapshot: &Snapshot) -> Result<UserSelectors> {
    compose_selectors(&user_selectors()).evaluate_as(snapshot)
}
