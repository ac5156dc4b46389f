//! Action creators pre-wired to a store's dispatch.
//!
//! Callers of a bound action never touch the store handle: calling it
//! builds the action and dispatches it. Binding the same creator to the
//! same store twice yields equal handles, so a bound action can serve as
//! a cache key.

use crate::store::Store;
use crate::types::{Action, StoreId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named function building an action from caller arguments.
///
/// Creators validate nothing and always succeed.
pub struct ActionCreator<A> {
    name: &'static str,
    build: fn(A) -> Action,
}

impl<A> ActionCreator<A> {
    pub const fn new(name: &'static str, build: fn(A) -> Action) -> Self {
        Self { name, build }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build the action without dispatching it.
    pub fn create(&self, args: A) -> Action {
        (self.build)(args)
    }
}

impl<A> Clone for ActionCreator<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for ActionCreator<A> {}

impl<A> fmt::Debug for ActionCreator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionCreator({})", self.name)
    }
}

/// An action creator bound to a store.
pub struct BoundAction<A> {
    creator: ActionCreator<A>,
    store: Store,
}

impl<A> BoundAction<A> {
    /// Build the action and dispatch it.
    pub fn call(&self, args: A) {
        self.store.dispatch(self.creator.create(args));
    }

    pub fn name(&self) -> &'static str {
        self.creator.name
    }

    pub fn store_id(&self) -> StoreId {
        self.store.id()
    }
}

impl<A> Clone for BoundAction<A> {
    fn clone(&self) -> Self {
        Self {
            creator: self.creator,
            store: self.store.clone(),
        }
    }
}

impl<A> PartialEq for BoundAction<A> {
    fn eq(&self, other: &Self) -> bool {
        self.store.id() == other.store.id() && self.creator.name == other.creator.name
    }
}

impl<A> Eq for BoundAction<A> {}

impl<A> Hash for BoundAction<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store.id().hash(state);
        self.creator.name.hash(state);
    }
}

impl<A> fmt::Debug for BoundAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction")
            .field("name", &self.creator.name)
            .field("store", &self.store.id())
            .finish()
    }
}

/// Bind a single creator to `store`.
pub fn bind_action<A>(creator: ActionCreator<A>, store: &Store) -> BoundAction<A> {
    BoundAction {
        creator,
        store: store.clone(),
    }
}

/// A duck's full set of action creators.
pub trait ActionCreatorSet {
    /// The same set with every creator bound to a store.
    type Bound;

    fn bind(store: &Store) -> Self::Bound;
}

/// Bind every creator of a set to `store`.
pub fn bind_actions<S: ActionCreatorSet>(store: &Store) -> S::Bound {
    S::bind(store)
}
