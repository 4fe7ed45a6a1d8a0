//! Dispatch instrumentation.
//!
//! [`Traced`] wraps any dispatcher and records a `tracing` span per message,
//! with one event before and one after the inner dispatch. The inner result is
//! returned as is. Wiring mistakes are logged at `ERROR`, domain rejections at
//! `WARN`.

use tracing::{debug, debug_span, error, warn};

use tellask_core::{Aggregate, Dispatch, DispatchResult, Family, Hosted, Message, Reply};

pub struct Traced<D> {
    inner: D,
}

impl<D> Traced<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

/// Registry layer: wrap a freshly loaded aggregate in [`Traced`].
pub fn layer<A: Aggregate>(hosted: Hosted<A>) -> Box<dyn Dispatch<A::Family> + Send> {
    debug!(
        family = <A::Family as Family>::NAME,
        aggregate_id = %hosted.identity(),
        "aggregate loaded"
    );
    Box::new(Traced::new(hosted))
}

impl<F: Family, D: Dispatch<F>> Dispatch<F> for Traced<D> {
    fn identity(&self) -> String {
        self.inner.identity()
    }

    fn dispatch(&mut self, message: &dyn Message) -> DispatchResult<Reply> {
        let span = debug_span!(
            "dispatch",
            family = F::NAME,
            aggregate_id = %self.inner.identity(),
            message_type = message.type_name(),
        );
        let _entered = span.enter();

        debug!(kind = ?message.kind(), "dispatching");
        let result = self.inner.dispatch(message);
        match &result {
            Ok(reply) => debug!(?reply, "dispatched"),
            Err(err) if err.is_programming_error() => error!(error = %err, "dispatch failed"),
            Err(err) => warn!(error = %err, "dispatch failed"),
        }
        result
    }
}
