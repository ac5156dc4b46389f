//! The user duck: who is logged in and what they are called.
//!
//! ```ignore
//! let store = create_app_store(StoreConfig::default())?;
//! let actions = bind_actions::<UserActions>(&store);
//!
//! actions.set_username.call("Ada".to_string());
//! assert_eq!(user::selectors::username(&store.get_state()), "Ada");
//! ```

pub mod actions;
pub mod reducer;
pub mod selectors;

pub use actions::{
    set_user, set_username, BoundUserActions, User, UserActionKind, UserActions, SET_USER,
    SET_USERNAME,
};
pub use reducer::{UserReducer, UserState, DEFAULT_TITLE, DEFAULT_USERNAME, USER_KEY};
pub use selectors::{select_user, user_selectors, UserSelectors};
