//! Storage port consumed by aggregates.
//!
//! The dispatch core never calls a repository itself: aggregates receive one
//! at construction and use it from their load hook and command handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::id::Identity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A snapshot could not be encoded or decoded.
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),

    /// The backing store could not be reached or is in an unusable state.
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Loads and saves the persisted representation of one aggregate family.
pub trait Repository {
    type Id: Identity;
    type Snapshot;

    /// Returns `None` when nothing has been stored for `id` yet.
    fn load(&self, id: &Self::Id) -> Result<Option<Self::Snapshot>, RepositoryError>;

    fn save(&self, id: &Self::Id, snapshot: &Self::Snapshot) -> Result<(), RepositoryError>;
}

impl<R: Repository + ?Sized> Repository for Arc<R> {
    type Id = R::Id;
    type Snapshot = R::Snapshot;

    fn load(&self, id: &Self::Id) -> Result<Option<Self::Snapshot>, RepositoryError> {
        (**self).load(id)
    }

    fn save(&self, id: &Self::Id, snapshot: &Self::Snapshot) -> Result<(), RepositoryError> {
        (**self).save(id, snapshot)
    }
}

impl<R: Repository + ?Sized> Repository for Box<R> {
    type Id = R::Id;
    type Snapshot = R::Snapshot;

    fn load(&self, id: &Self::Id) -> Result<Option<Self::Snapshot>, RepositoryError> {
        (**self).load(id)
    }

    fn save(&self, id: &Self::Id, snapshot: &Self::Snapshot) -> Result<(), RepositoryError> {
        (**self).save(id, snapshot)
    }
}
