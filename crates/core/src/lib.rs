//! `tellask-core` — in-process command/query dispatch for aggregates.
//!
//! Every aggregate exposes two channels: commands (mutate, no result) and
//! queries (read, typed result). A per-aggregate [`DispatchTable`] resolves an
//! incoming message to its handler by the message's concrete type, a
//! [`Client`] narrows that untyped entry point to `tell`/`ask` for one family,
//! and a [`Registry`] turns a family plus an identity into a loaded client.
//!
//! The crate performs no I/O and never logs; storage and instrumentation are
//! supplied by the embedding service.

pub mod aggregate;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod message;
pub mod registry;
pub mod repository;

#[cfg(test)]
mod testing;

pub use aggregate::{Aggregate, Hosted, Lifecycle};
pub use client::Client;
pub use dispatch::{Dispatch, DispatchTable, Reply, Routes, Value};
pub use error::{DispatchError, DispatchResult};
pub use id::{Identity, IdentityError};
pub use message::{Command, Family, Message, MessageKind, Query};
pub use registry::{FamilyRoutes, Registry};
pub use repository::{Repository, RepositoryError};

#[doc(hidden)]
pub mod __private {
    pub use serde;

    /// Implemented by the `command!` and `query!` macros only.
    pub trait Sealed {}
}
