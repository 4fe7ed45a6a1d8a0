//! Message taxonomy: commands and queries, each bound to one aggregate family.
//!
//! A message type is tagged exactly once, through [`command!`](crate::command)
//! or [`query!`](crate::query). The macro implements both the static binding
//! (`Command<F>` / `Query<F>`) and the runtime tag reported by
//! [`Message::kind`], so the two can never disagree.

use core::any::Any;
use core::fmt::{self, Debug};

use crate::id::Identity;

/// Type-level tag for one aggregate family (the `T` in `Command<T>`).
///
/// Families carry no data; declare them as uninhabited enums.
pub trait Family: 'static {
    /// Stable name used in errors, registry listings and logs.
    const NAME: &'static str;

    /// Identity type shared by every aggregate of this family.
    type Id: Identity;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Command,
    Query,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Command => f.write_str("command"),
            MessageKind::Query => f.write_str("query"),
        }
    }
}

/// Access to the concrete value behind a `dyn Message`.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Anything that can be handed to a dispatcher.
///
/// `kind` returns `None` for values that are not tagged as a command or a
/// query; dispatching one fails with `UnrecognizedMessage`.
pub trait Message: AsAny + Debug + 'static {
    fn kind(&self) -> Option<MessageKind>;

    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// A state-changing request addressed to family `F`. Produces no value.
///
/// Sealed: implemented only through [`command!`](crate::command).
pub trait Command<F: Family>: Message + crate::__private::Sealed {}

/// A read-only request addressed to family `F`, answered with `Result`.
///
/// Sealed: implemented only through [`query!`](crate::query).
pub trait Query<F: Family>: Message + crate::__private::Sealed {
    type Result: Any + Debug;
}

/// Tag a type as a command of an aggregate family.
///
/// ```ignore
/// pub struct Open;
/// tellask_core::command!(Open => ItemFamily);
/// ```
#[macro_export]
macro_rules! command {
    ($t:ty => $family:ty) => {
        impl $crate::message::Message for $t {
            fn kind(&self) -> Option<$crate::message::MessageKind> {
                Some($crate::message::MessageKind::Command)
            }
        }

        impl $crate::__private::Sealed for $t {}

        impl $crate::message::Command<$family> for $t {}
    };
}

/// Tag a type as a query of an aggregate family with its result type.
///
/// ```ignore
/// pub struct IsClosed;
/// tellask_core::query!(IsClosed => ItemFamily, bool);
/// ```
#[macro_export]
macro_rules! query {
    ($t:ty => $family:ty, $result:ty) => {
        impl $crate::message::Message for $t {
            fn kind(&self) -> Option<$crate::message::MessageKind> {
                Some($crate::message::MessageKind::Query)
            }
        }

        impl $crate::__private::Sealed for $t {}

        impl $crate::message::Query<$family> for $t {
            type Result = $result;
        }
    };
}
