//! Aggregate contract and lifecycle.

use core::fmt;
use std::sync::Arc;

use crate::dispatch::{Dispatch, DispatchTable, Reply, Routes};
use crate::error::{DispatchError, DispatchResult};
use crate::id::Identity;
use crate::message::{Family, Message};

/// An entity that owns its state exclusively and exposes it only through the
/// commands and queries routed in [`Aggregate::routes`].
///
/// Implementations are plain state holders: construction wires collaborators,
/// [`on_load`](Aggregate::on_load) establishes the initial state, and every
/// later mutation happens inside a command handler.
pub trait Aggregate: Sized + Send + 'static {
    type Family: Family;

    /// Storage collaborator handed over at construction (use `()` when the
    /// aggregate persists nothing).
    type Repository;

    fn new(id: <Self::Family as Family>::Id, repository: Self::Repository) -> Self;

    fn id(&self) -> &<Self::Family as Family>::Id;

    /// Establish initial in-memory state. Runs exactly once per instance,
    /// before any message is dispatched.
    fn on_load(&mut self) -> DispatchResult<()>;

    /// Declare the handler for every message this aggregate serves.
    fn routes() -> Routes<Self>;
}

/// In-memory lifecycle of a hosted aggregate.
///
/// `Ready` is terminal; domain-level states such as "closed" are ordinary
/// aggregate data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Uninitialized,
    Loading,
    Ready,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Uninitialized => f.write_str("uninitialized"),
            Lifecycle::Loading => f.write_str("loading"),
            Lifecycle::Ready => f.write_str("ready"),
        }
    }
}

/// An aggregate instance bound to its dispatch table and lifecycle.
///
/// A failed load leaves the instance in `Loading`: it never becomes ready and a
/// second `load` is a `DoubleLoad`.
pub struct Hosted<A: Aggregate> {
    aggregate: A,
    table: Arc<DispatchTable<A>>,
    lifecycle: Lifecycle,
}

impl<A: Aggregate> Hosted<A> {
    pub fn new(aggregate: A, table: Arc<DispatchTable<A>>) -> Self {
        Self {
            aggregate,
            table,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    /// Host `aggregate` with a table built just for it.
    pub fn standalone(aggregate: A) -> DispatchResult<Self> {
        Ok(Self::new(aggregate, Arc::new(DispatchTable::build()?)))
    }

    /// Run the aggregate's load hook. Fails fast with `DoubleLoad` on any
    /// instance that is not `Uninitialized`.
    pub fn load(&mut self) -> DispatchResult<()> {
        if self.lifecycle != Lifecycle::Uninitialized {
            return Err(DispatchError::DoubleLoad {
                aggregate: <A::Family as Family>::NAME,
                id: self.aggregate.id().canonical(),
            });
        }
        self.lifecycle = Lifecycle::Loading;
        self.aggregate.on_load()?;
        self.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    /// Read-only view of the hosted state.
    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    pub fn table(&self) -> &DispatchTable<A> {
        &self.table
    }
}

impl<A: Aggregate> Dispatch<A::Family> for Hosted<A> {
    fn identity(&self) -> String {
        self.aggregate.id().canonical()
    }

    fn dispatch(&mut self, message: &dyn Message) -> DispatchResult<Reply> {
        if self.lifecycle != Lifecycle::Ready {
            return Err(DispatchError::NotReady {
                aggregate: <A::Family as Family>::NAME,
                id: self.aggregate.id().canonical(),
                state: self.lifecycle,
            });
        }
        self.table.route(&mut self.aggregate, message)
    }
}

impl<A: Aggregate + fmt::Debug> fmt::Debug for Hosted<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hosted")
            .field("aggregate", &self.aggregate)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
