//! Ducks: one module per sub-state, each bundling its action kinds,
//! action creators, reducer and selectors.

pub mod user;
