//! Dispatch error model.

use thiserror::Error;

use crate::aggregate::Lifecycle;
use crate::repository::RepositoryError;

/// Result type used across the dispatch core.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failure raised while routing a message, building a dispatch table, or
/// resolving an aggregate from a registry.
///
/// Every variant is a local, synchronous failure. Routing failures
/// (`UnrecognizedMessage`, `UnhandledCommand`, `UnhandledQuery`) are raised
/// before any handler runs, so aggregate state is untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The message is tagged neither as a command nor as a query.
    #[error("unrecognized message: {message_type}")]
    UnrecognizedMessage { message_type: &'static str },

    /// No command handler is routed for the message's concrete type.
    #[error("aggregate '{aggregate}' has no handler for command {message_type}")]
    UnhandledCommand {
        aggregate: &'static str,
        message_type: &'static str,
    },

    /// No query handler is routed for the message's concrete type.
    #[error("aggregate '{aggregate}' has no answer for query {message_type}")]
    UnhandledQuery {
        aggregate: &'static str,
        message_type: &'static str,
    },

    /// A reply did not carry the type the caller expected.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The registry has no factory for the requested aggregate family.
    #[error("aggregate type '{family}' is not registered")]
    UnregisteredAggregateType { family: &'static str },

    /// The same family was registered twice in one registry.
    #[error("aggregate type '{family}' is already registered")]
    DuplicateFamily { family: &'static str },

    /// A message type was routed to more than one handler.
    #[error("aggregate '{aggregate}' routes {message_type} more than once")]
    DuplicateHandler {
        aggregate: &'static str,
        message_type: &'static str,
    },

    /// The load hook was invoked on an instance that already ran it.
    #[error("aggregate '{aggregate}' [{id}] was already loaded")]
    DoubleLoad { aggregate: &'static str, id: String },

    /// A message reached an instance whose load hook has not completed.
    #[error("aggregate '{aggregate}' [{id}] is not ready (state: {state})")]
    NotReady {
        aggregate: &'static str,
        id: String,
        state: Lifecycle,
    },

    /// A handler refused the message on domain grounds.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DispatchError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn type_mismatch<Expected: ?Sized>(found: &'static str) -> Self {
        Self::TypeMismatch {
            expected: core::any::type_name::<Expected>(),
            found,
        }
    }

    /// True for failures that indicate a wiring mistake rather than a domain
    /// outcome (missing handlers, missing registrations, lifecycle misuse).
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedMessage { .. }
                | Self::UnhandledCommand { .. }
                | Self::UnhandledQuery { .. }
                | Self::UnregisteredAggregateType { .. }
                | Self::DuplicateFamily { .. }
                | Self::DuplicateHandler { .. }
                | Self::DoubleLoad { .. }
                | Self::NotReady { .. }
        )
    }
}
