//! Typed façade over one aggregate instance.

use core::fmt;
use core::marker::PhantomData;

use crate::dispatch::Dispatch;
use crate::error::DispatchResult;
use crate::message::{Command, Family, Query};

/// Narrows the untyped dispatch contract to `tell` and `ask` for family `F`.
///
/// Only `Command<F>` and `Query<F>` values are accepted, so sending another
/// family's messages is a compile error. The client owns its dispatcher;
/// `&mut self` keeps at most one call in flight per instance. A client is
/// `Send`, so it can be moved to (or shared behind a lock with) another thread.
pub struct Client<F: Family> {
    target: Box<dyn Dispatch<F> + Send>,
    _family: PhantomData<fn() -> F>,
}

impl<F: Family> Client<F> {
    pub fn new(target: Box<dyn Dispatch<F> + Send>) -> Self {
        Self {
            target,
            _family: PhantomData,
        }
    }

    /// Canonical identity of the wrapped aggregate.
    pub fn identity(&self) -> String {
        self.target.identity()
    }

    /// Send a command. Dispatch errors propagate unchanged.
    pub fn tell<C: Command<F>>(&mut self, cmd: C) -> DispatchResult<()> {
        self.target.dispatch(&cmd).map(|_| ())
    }

    /// Send a query and return its typed answer.
    ///
    /// Fails with `TypeMismatch` if the dispatcher replies with anything other
    /// than a `Q::Result`.
    pub fn ask<Q: Query<F>>(&mut self, qry: Q) -> DispatchResult<Q::Result> {
        self.target.dispatch(&qry)?.into_value::<Q::Result>()
    }
}

impl<F: Family> fmt::Debug for Client<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("family", &F::NAME)
            .field("identity", &self.target.identity())
            .finish()
    }
}
