//! Fixture aggregates shared by the unit tests of this crate.

use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::dispatch::Routes;
use crate::error::{DispatchError, DispatchResult};
use crate::message::{Family, Message, MessageKind};

pub enum Counters {}

impl Family for Counters {
    const NAME: &'static str = "counter";
    type Id = Uuid;
}

#[derive(Debug)]
pub struct Bump(pub i64);
crate::command!(Bump => Counters);

/// Tagged as a command but never routed.
#[derive(Debug)]
pub struct Reset;
crate::command!(Reset => Counters);

#[derive(Debug)]
pub struct Count;
crate::query!(Count => Counters, i64);

/// Tagged as a query but never routed.
#[derive(Debug)]
pub struct Peek;
crate::query!(Peek => Counters, i64);

/// Neither a command nor a query.
#[derive(Debug)]
pub struct Unrouted;

impl Message for Unrouted {
    fn kind(&self) -> Option<MessageKind> {
        None
    }
}

#[derive(Debug, Default)]
pub struct Counter {
    pub id: Uuid,
    pub value: i64,
    pub loads: u32,
}

impl Counter {
    fn bump(&mut self, cmd: &Bump) -> DispatchResult<()> {
        self.value += cmd.0;
        Ok(())
    }

    fn count(&self, _: &Count) -> i64 {
        self.value
    }
}

impl Aggregate for Counter {
    type Family = Counters;
    type Repository = ();

    fn new(id: Uuid, _: ()) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn on_load(&mut self) -> DispatchResult<()> {
        self.loads += 1;
        Ok(())
    }

    fn routes() -> Routes<Self> {
        Routes::<Self>::new().command(Self::bump).query(Self::count)
    }
}

/// Aggregate whose load hook always fails.
#[derive(Debug)]
pub struct FailingLoad {
    id: Uuid,
}

impl Aggregate for FailingLoad {
    type Family = Counters;
    type Repository = ();

    fn new(id: Uuid, _: ()) -> Self {
        Self { id }
    }

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn on_load(&mut self) -> DispatchResult<()> {
        Err(DispatchError::rejected("storage offline"))
    }

    fn routes() -> Routes<Self> {
        Routes::new()
    }
}
