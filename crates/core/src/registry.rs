//! Registry of aggregate families for one bounded context.
//!
//! The registry is an explicit table from a family's type tag to a factory.
//! Each factory owns the wiring for its family: build a repository, construct
//! the aggregate, run its load hook and wrap it in a [`Client`].

use core::any::{Any, TypeId};
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use crate::aggregate::{Aggregate, Hosted};
use crate::client::Client;
use crate::dispatch::{Dispatch, DispatchTable};
use crate::error::{DispatchError, DispatchResult};
use crate::message::Family;

type Factory<F> =
    Box<dyn Fn(<F as Family>::Id) -> DispatchResult<Box<dyn Dispatch<F> + Send>> + Send + Sync>;

/// One registered family and the message types its aggregate serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyRoutes {
    pub family: &'static str,
    pub commands: Vec<&'static str>,
    pub queries: Vec<&'static str>,
}

struct Entry {
    routes: FamilyRoutes,
    /// Always a `Factory<F>` for the family keyed by this entry.
    factory: Box<dyn Any + Send + Sync>,
}

pub struct Registry {
    context: String,
    entries: HashMap<TypeId, Entry>,
}

impl Registry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            entries: HashMap::new(),
        }
    }

    /// Name of the bounded context this registry serves.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Register `A` as the implementation of its family.
    ///
    /// `make_repository` runs once per [`Registry::get`], after the family has
    /// been resolved.
    pub fn register<A, R>(&mut self, make_repository: R) -> DispatchResult<&mut Self>
    where
        A: Aggregate,
        R: Fn() -> A::Repository + Send + Sync + 'static,
    {
        self.register_with::<A, R, _>(
            make_repository,
            |hosted| -> Box<dyn Dispatch<A::Family> + Send> { Box::new(hosted) },
        )
    }

    /// Register `A` and pass every loaded instance through `wrap` before it is
    /// handed to a client (instrumentation and similar decorators).
    pub fn register_with<A, R, W>(&mut self, make_repository: R, wrap: W) -> DispatchResult<&mut Self>
    where
        A: Aggregate,
        R: Fn() -> A::Repository + Send + Sync + 'static,
        W: Fn(Hosted<A>) -> Box<dyn Dispatch<A::Family> + Send> + Send + Sync + 'static,
    {
        let key = TypeId::of::<A::Family>();
        let family = <A::Family as Family>::NAME;
        if self.entries.contains_key(&key) {
            return Err(DispatchError::DuplicateFamily { family });
        }

        let table = Arc::new(DispatchTable::<A>::build()?);
        let routes = FamilyRoutes {
            family,
            commands: table.commands(),
            queries: table.queries(),
        };

        let factory: Factory<A::Family> = Box::new(move |id| {
            let aggregate = A::new(id, make_repository());
            let mut hosted = Hosted::new(aggregate, Arc::clone(&table));
            hosted.load()?;
            Ok(wrap(hosted))
        });

        self.entries.insert(
            key,
            Entry {
                routes,
                factory: Box::new(factory),
            },
        );
        Ok(self)
    }

    /// Construct, load and wrap the aggregate of family `F` named by `id`.
    ///
    /// An unregistered family fails with `UnregisteredAggregateType` before
    /// anything is constructed.
    pub fn get<F: Family>(&self, id: F::Id) -> DispatchResult<Client<F>> {
        let unregistered = || DispatchError::UnregisteredAggregateType { family: F::NAME };
        let factory = self
            .entries
            .get(&TypeId::of::<F>())
            .and_then(|entry| entry.factory.downcast_ref::<Factory<F>>())
            .ok_or_else(unregistered)?;
        factory(id).map(Client::new)
    }

    pub fn contains<F: Family>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<F>())
    }

    /// Registered family names, sorted.
    pub fn families(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|e| e.routes.family).collect();
        names.sort_unstable();
        names
    }

    /// Every registered family with its routed message types, sorted by family.
    pub fn describe(&self) -> Vec<FamilyRoutes> {
        let mut routes: Vec<_> = self.entries.values().map(|e| e.routes.clone()).collect();
        routes.sort_by(|a, b| a.family.cmp(b.family));
        routes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("context", &self.context)
            .field("families", &self.families())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Bump, Count, Counter, Counters};
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    enum Ledgers {}

    impl Family for Ledgers {
        const NAME: &'static str = "ledger";
        type Id = Uuid;
    }

    #[test]
    fn get_returns_a_loaded_client() {
        let mut registry = Registry::new("bench");
        registry.register::<Counter, _>(|| ()).unwrap();

        let mut counter = registry.get::<Counters>(Uuid::nil()).unwrap();
        assert_eq!(counter.ask(Count).unwrap(), 0);
        counter.tell(Bump(4)).unwrap();
        assert_eq!(counter.ask(Count).unwrap(), 4);
    }

    #[test]
    fn each_get_builds_a_fresh_instance() {
        let mut registry = Registry::new("bench");
        registry.register::<Counter, _>(|| ()).unwrap();

        let mut first = registry.get::<Counters>(Uuid::nil()).unwrap();
        first.tell(Bump(1)).unwrap();

        let mut second = registry.get::<Counters>(Uuid::nil()).unwrap();
        assert_eq!(second.ask(Count).unwrap(), 0);
    }

    #[test]
    fn unregistered_family_constructs_nothing() {
        let built = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&built);

        let mut registry = Registry::new("bench");
        registry
            .register::<Counter, _>(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let err = registry.get::<Ledgers>(Uuid::nil()).unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnregisteredAggregateType { family: "ledger" }
        );
        assert_eq!(built.load(Ordering::SeqCst), 0);

        registry.get::<Counters>(Uuid::nil()).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registering_a_family_twice_fails() {
        let mut registry = Registry::new("bench");
        registry.register::<Counter, _>(|| ()).unwrap();

        let err = registry.register::<Counter, _>(|| ()).unwrap_err();
        assert_eq!(err, DispatchError::DuplicateFamily { family: "counter" });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn a_table_with_a_duplicate_route_is_not_registered() {
        struct Doubled {
            id: Uuid,
        }

        impl Aggregate for Doubled {
            type Family = Counters;
            type Repository = ();

            fn new(id: Uuid, _: ()) -> Self {
                Self { id }
            }

            fn id(&self) -> &Uuid {
                &self.id
            }

            fn on_load(&mut self) -> DispatchResult<()> {
                Ok(())
            }

            fn routes() -> crate::dispatch::Routes<Self> {
                crate::dispatch::Routes::new()
                    .command(|_: &mut Doubled, _: &Bump| Ok(()))
                    .command(|_: &mut Doubled, _: &Bump| Ok(()))
            }
        }

        let mut registry = Registry::new("bench");
        let err = registry.register::<Doubled, _>(|| ()).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::DuplicateHandler { aggregate: "counter", .. }
        ));
        assert!(registry.is_empty());
        assert!(!registry.contains::<Counters>());
    }

    #[test]
    fn registry_and_clients_cross_threads() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Client<Counters>>();
        assert_send::<Registry>();
        assert_sync::<Registry>();

        let mut registry = Registry::new("bench");
        registry.register::<Counter, _>(|| ()).unwrap();
        let registry = Arc::new(registry);

        let shared = Arc::clone(&registry);
        let answer = std::thread::spawn(move || {
            let mut counter = shared.get::<Counters>(Uuid::nil()).unwrap();
            counter.tell(Bump(9)).unwrap();
            counter.ask(Count).unwrap()
        })
        .join()
        .unwrap();
        assert_eq!(answer, 9);
    }

    #[test]
    fn registry_is_enumerable() {
        let mut registry = Registry::new("bench");
        assert!(registry.is_empty());
        registry.register::<Counter, _>(|| ()).unwrap();

        assert!(registry.contains::<Counters>());
        assert!(!registry.contains::<Ledgers>());
        assert_eq!(registry.families(), vec!["counter"]);

        let described = registry.describe();
        assert_eq!(described.len(), 1);
        assert_eq!(described[0].commands.len(), 1);
        assert_eq!(described[0].queries.len(), 1);
    }

    #[test]
    fn wrapped_registration_still_dispatches_once() {
        struct Tally<D> {
            inner: D,
            calls: Arc<AtomicU32>,
        }

        impl<D: Dispatch<Counters>> Dispatch<Counters> for Tally<D> {
            fn identity(&self) -> String {
                self.inner.identity()
            }

            fn dispatch(
                &mut self,
                message: &dyn crate::message::Message,
            ) -> DispatchResult<crate::dispatch::Reply> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.inner.dispatch(message)
            }
        }

        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let mut registry = Registry::new("bench");
        registry
            .register_with::<Counter, _, _>(
                || (),
                move |hosted| -> Box<dyn Dispatch<Counters> + Send> {
                    Box::new(Tally {
                        inner: hosted,
                        calls: Arc::clone(&seen),
                    })
                },
            )
            .unwrap();

        let mut counter = registry.get::<Counters>(Uuid::nil()).unwrap();
        counter.tell(Bump(2)).unwrap();
        assert_eq!(counter.ask(Count).unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
