//! Item aggregate family.
//!
//! Items carry a counter (`state`) and a closed flag. They are rehydrated from
//! an [`ItemsRepository`] on load and persist only when told to.

pub mod item;

pub use item::{
    Close, CurrentState, INITIAL_STATE, IsClosed, Item, ItemFamily, ItemId, ItemSnapshot,
    ItemsRepository, Open, Persist,
};
