//! Message routing: one entry point, many typed handlers.
//!
//! Each aggregate type declares its handlers once through [`Routes`]. The
//! resulting [`DispatchTable`] maps the concrete `TypeId` of a message to a
//! type-erased handler, so resolving a message is a plain map lookup keyed by
//! the exact runtime type (never by a base or trait type).

use core::any::{Any, TypeId, type_name};
use core::fmt::{self, Debug};
use std::collections::HashMap;

use crate::aggregate::Aggregate;
use crate::error::{DispatchError, DispatchResult};
use crate::message::{Command, Family, Message, MessageKind, Query};

type CommandFn<A> = Box<dyn Fn(&mut A, &dyn Message) -> DispatchResult<()> + Send + Sync>;
type QueryFn<A> = Box<dyn Fn(&A, &dyn Message) -> DispatchResult<Value> + Send + Sync>;

struct Route<H> {
    message_type: &'static str,
    handler: H,
}

/// Object-safe entry point for every interaction with one aggregate instance
/// of family `F`.
///
/// Decorators (instrumentation, auditing) implement this trait by wrapping
/// another `Dispatch<F>`; they must call the inner `dispatch` exactly once per
/// call and hand its result back unchanged.
pub trait Dispatch<F: Family> {
    /// Canonical identity of the aggregate behind this dispatcher.
    fn identity(&self) -> String;

    fn dispatch(&mut self, message: &dyn Message) -> DispatchResult<Reply>;
}

impl<F: Family, D: Dispatch<F> + ?Sized> Dispatch<F> for Box<D> {
    fn identity(&self) -> String {
        (**self).identity()
    }

    fn dispatch(&mut self, message: &dyn Message) -> DispatchResult<Reply> {
        (**self).dispatch(message)
    }
}

/// Outcome of a successful dispatch.
#[derive(Debug)]
pub enum Reply {
    /// A command ran.
    Unit,
    /// A query produced a value.
    Value(Value),
}

impl Reply {
    pub fn is_unit(&self) -> bool {
        matches!(self, Reply::Unit)
    }

    /// Extract a typed query result, failing with `TypeMismatch` when the reply
    /// holds something else.
    pub fn into_value<T: Any>(self) -> DispatchResult<T> {
        match self {
            Reply::Unit => Err(DispatchError::type_mismatch::<T>(type_name::<()>())),
            Reply::Value(value) => value.downcast(),
        }
    }
}

trait Payload: Any + Debug {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Debug> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A query result with its concrete type erased but remembered by name.
pub struct Value {
    type_name: &'static str,
    inner: Box<dyn Payload>,
}

impl Value {
    pub fn new<T: Any + Debug>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            inner: Box::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).as_any().is::<T>()
    }

    pub fn downcast<T: Any>(self) -> DispatchResult<T> {
        let found = self.type_name;
        self.inner
            .into_any()
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| DispatchError::type_mismatch::<T>(found))
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.inner, f)
    }
}

/// Builder for an aggregate's dispatch table.
///
/// Registering the same message type twice is recorded and reported by
/// [`Routes::build`] as `DuplicateHandler`.
pub struct Routes<A> {
    commands: HashMap<TypeId, Route<CommandFn<A>>>,
    queries: HashMap<TypeId, Route<QueryFn<A>>>,
    duplicate: Option<&'static str>,
}

impl<A: Aggregate> Default for Routes<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Aggregate> Routes<A> {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            queries: HashMap::new(),
            duplicate: None,
        }
    }

    /// Route command `C` to `handler`.
    pub fn command<C, H>(mut self, handler: H) -> Self
    where
        C: Command<A::Family>,
        H: Fn(&mut A, &C) -> DispatchResult<()> + Send + Sync + 'static,
    {
        let erased: CommandFn<A> = Box::new(move |aggregate, message| {
            let cmd = message
                .as_any()
                .downcast_ref::<C>()
                .ok_or_else(|| DispatchError::type_mismatch::<C>(message.type_name()))?;
            handler(aggregate, cmd)
        });
        let route = Route {
            message_type: type_name::<C>(),
            handler: erased,
        };
        if self.commands.insert(TypeId::of::<C>(), route).is_some() {
            self.duplicate.get_or_insert(type_name::<C>());
        }
        self
    }

    /// Route query `Q` to `handler`. Query handlers only get shared access.
    pub fn query<Q, H>(mut self, handler: H) -> Self
    where
        Q: Query<A::Family>,
        H: Fn(&A, &Q) -> Q::Result + Send + Sync + 'static,
    {
        let erased: QueryFn<A> = Box::new(move |aggregate, message| {
            let qry = message
                .as_any()
                .downcast_ref::<Q>()
                .ok_or_else(|| DispatchError::type_mismatch::<Q>(message.type_name()))?;
            Ok(Value::new(handler(aggregate, qry)))
        });
        let route = Route {
            message_type: type_name::<Q>(),
            handler: erased,
        };
        if self.queries.insert(TypeId::of::<Q>(), route).is_some() {
            self.duplicate.get_or_insert(type_name::<Q>());
        }
        self
    }

    pub fn build(self) -> DispatchResult<DispatchTable<A>> {
        if let Some(message_type) = self.duplicate {
            return Err(DispatchError::DuplicateHandler {
                aggregate: <A::Family as Family>::NAME,
                message_type,
            });
        }
        Ok(DispatchTable {
            commands: self.commands,
            queries: self.queries,
        })
    }
}

/// Immutable handler table for aggregate type `A`, built once and shared by
/// every instance of `A`.
pub struct DispatchTable<A> {
    commands: HashMap<TypeId, Route<CommandFn<A>>>,
    queries: HashMap<TypeId, Route<QueryFn<A>>>,
}

impl<A: Aggregate> DispatchTable<A> {
    /// Build the table from the aggregate's declared routes.
    pub fn build() -> DispatchResult<Self> {
        A::routes().build()
    }

    /// Resolve `message` by its exact runtime type and invoke its handler.
    ///
    /// The routed handler decides command or query; the message's own
    /// [`kind`](Message::kind) only picks the error for an unrouted type.
    /// Lookup happens before the handler runs: an unrecognized or unhandled
    /// message never touches `aggregate`.
    pub fn route(&self, aggregate: &mut A, message: &dyn Message) -> DispatchResult<Reply> {
        let type_id = message.as_any().type_id();
        if let Some(route) = self.commands.get(&type_id) {
            (route.handler)(aggregate, message)?;
            return Ok(Reply::Unit);
        }
        if let Some(route) = self.queries.get(&type_id) {
            return (route.handler)(aggregate, message).map(Reply::Value);
        }
        let aggregate = <A::Family as Family>::NAME;
        let message_type = message.type_name();
        Err(match message.kind() {
            Some(MessageKind::Command) => DispatchError::UnhandledCommand {
                aggregate,
                message_type,
            },
            Some(MessageKind::Query) => DispatchError::UnhandledQuery {
                aggregate,
                message_type,
            },
            None => DispatchError::UnrecognizedMessage { message_type },
        })
    }

    /// Whether a handler is routed for the message's concrete type.
    pub fn handles(&self, message: &dyn Message) -> bool {
        let type_id = message.as_any().type_id();
        self.commands.contains_key(&type_id) || self.queries.contains_key(&type_id)
    }

    /// Routed command types, sorted by name.
    pub fn commands(&self) -> Vec<&'static str> {
        sorted_names(self.commands.values().map(|r| r.message_type))
    }

    /// Routed query types, sorted by name.
    pub fn queries(&self) -> Vec<&'static str> {
        sorted_names(self.queries.values().map(|r| r.message_type))
    }
}

impl<A> Debug for DispatchTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("commands", &self.commands.len())
            .field("queries", &self.queries.len())
            .finish()
    }
}

fn sorted_names(names: impl Iterator<Item = &'static str>) -> Vec<&'static str> {
    let mut names: Vec<_> = names.collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Bump, Count, Counter, Peek, Reset, Unrouted};

    #[test]
    fn commands_reach_their_handler_and_reply_unit() {
        let table = DispatchTable::<Counter>::build().unwrap();
        let mut counter = Counter::default();

        let reply = table.route(&mut counter, &Bump(3)).unwrap();
        assert!(reply.is_unit());
        assert_eq!(counter.value, 3);
    }

    #[test]
    fn queries_return_their_typed_value() {
        let table = DispatchTable::<Counter>::build().unwrap();
        let mut counter = Counter::default();
        table.route(&mut counter, &Bump(2)).unwrap();

        let reply = table.route(&mut counter, &Count).unwrap();
        assert_eq!(reply.into_value::<i64>().unwrap(), 2);
    }

    #[test]
    fn unhandled_messages_fail_without_touching_state() {
        let table = DispatchTable::<Counter>::build().unwrap();
        let mut counter = Counter::default();
        table.route(&mut counter, &Bump(5)).unwrap();

        let err = table.route(&mut counter, &Reset).unwrap_err();
        assert!(matches!(err, DispatchError::UnhandledCommand { aggregate: "counter", .. }));

        let err = table.route(&mut counter, &Peek).unwrap_err();
        assert!(matches!(err, DispatchError::UnhandledQuery { aggregate: "counter", .. }));

        assert_eq!(counter.value, 5);
    }

    #[test]
    fn untagged_messages_are_unrecognized() {
        let table = DispatchTable::<Counter>::build().unwrap();
        let mut counter = Counter::default();

        let err = table.route(&mut counter, &Unrouted).unwrap_err();
        assert!(matches!(err, DispatchError::UnrecognizedMessage { .. }));
        assert!(!table.handles(&Unrouted));
    }

    #[test]
    fn routing_a_type_twice_is_rejected_at_build() {
        let routes = Routes::<Counter>::new()
            .command(|c: &mut Counter, cmd: &Bump| {
                c.value += cmd.0;
                Ok(())
            })
            .command(|c: &mut Counter, _: &Bump| {
                c.value = 0;
                Ok(())
            });

        match routes.build() {
            Err(DispatchError::DuplicateHandler { message_type, .. }) => {
                assert!(message_type.ends_with("Bump"));
            }
            other => panic!("expected DuplicateHandler, got {other:?}"),
        }
    }

    /// Tagged by hand with the wrong kind; only the `Query` impl is routed.
    #[derive(Debug)]
    struct Mislabelled;

    impl Message for Mislabelled {
        fn kind(&self) -> Option<MessageKind> {
            Some(MessageKind::Command)
        }
    }

    impl crate::__private::Sealed for Mislabelled {}

    impl Query<crate::testing::Counters> for Mislabelled {
        type Result = i64;
    }

    #[test]
    fn routing_follows_the_registered_handler_not_the_runtime_tag() {
        let table = Routes::<Counter>::new()
            .query(|c: &Counter, _: &Mislabelled| c.value * 10)
            .build()
            .unwrap();
        let mut counter = Counter {
            value: 4,
            ..Counter::default()
        };

        assert!(table.handles(&Mislabelled));
        let reply = table.route(&mut counter, &Mislabelled).unwrap();
        assert_eq!(reply.into_value::<i64>().unwrap(), 40);
    }

    #[test]
    fn table_enumerates_routed_types() {
        let table = DispatchTable::<Counter>::build().unwrap();
        assert_eq!(table.commands().len(), 1);
        assert!(table.commands()[0].ends_with("Bump"));
        assert_eq!(table.queries().len(), 1);
        assert!(table.handles(&Count));
        assert!(!table.handles(&Peek));
    }

    #[test]
    fn value_downcast_reports_both_types_on_mismatch() {
        let value = Value::new(true);
        assert!(value.is::<bool>());
        assert_eq!(format!("{value:?}"), "true");

        let err = value.downcast::<i64>().unwrap_err();
        assert_eq!(
            err,
            DispatchError::TypeMismatch {
                expected: "i64",
                found: "bool"
            }
        );
    }

    #[test]
    fn unit_reply_is_not_a_value() {
        let err = Reply::Unit.into_value::<bool>().unwrap_err();
        assert!(matches!(err, DispatchError::TypeMismatch { found: "()", .. }));
    }
}
