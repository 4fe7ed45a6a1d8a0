use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tellask_core::{Aggregate, DispatchError, DispatchResult, Family, Repository, Routes};

tellask_core::string_identity!(ItemId, "ItemId");

/// Aggregate family: items.
pub enum ItemFamily {}

impl Family for ItemFamily {
    const NAME: &'static str = "item";
    type Id = ItemId;
}

/// Counter value of an item that has never been persisted.
pub const INITIAL_STATE: i64 = 42;

/// Persisted representation of an [`Item`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub state: i64,
    pub closed: bool,
}

/// Storage port for items. Shared across threads by every loaded item.
pub type ItemsRepository = dyn Repository<Id = ItemId, Snapshot = ItemSnapshot> + Send + Sync;

/// Command: Open. Advances the item's counter by one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Open;
tellask_core::command!(Open => ItemFamily);

/// Command: Close.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Close;
tellask_core::command!(Close => ItemFamily);

/// Command: Persist. Saves the current state through the repository.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Persist;
tellask_core::command!(Persist => ItemFamily);

/// Query: IsClosed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IsClosed;
tellask_core::query!(IsClosed => ItemFamily, bool);

/// Query: CurrentState. The item's counter value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CurrentState;
tellask_core::query!(CurrentState => ItemFamily, i64);

/// Aggregate root: Item.
pub struct Item {
    id: ItemId,
    state: i64,
    closed: bool,
    repository: Arc<ItemsRepository>,
}

impl Item {
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            state: self.state,
            closed: self.closed,
        }
    }

    fn open(&mut self, _: &Open) -> DispatchResult<()> {
        self.state = self
            .state
            .checked_add(1)
            .ok_or_else(|| DispatchError::rejected("item state overflow"))?;
        debug!(item_id = %self.id, state = self.state, "item opened");
        Ok(())
    }

    fn close(&mut self, _: &Close) -> DispatchResult<()> {
        self.closed = true;
        debug!(item_id = %self.id, "item closed");
        Ok(())
    }

    fn persist(&mut self, _: &Persist) -> DispatchResult<()> {
        self.repository.save(&self.id, &self.snapshot())?;
        debug!(item_id = %self.id, "item persisted");
        Ok(())
    }

    fn is_closed(&self, _: &IsClosed) -> bool {
        self.closed
    }

    fn current_state(&self, _: &CurrentState) -> i64 {
        self.state
    }
}

impl Aggregate for Item {
    type Family = ItemFamily;
    type Repository = Arc<ItemsRepository>;

    fn new(id: ItemId, repository: Arc<ItemsRepository>) -> Self {
        Self {
            id,
            state: 0,
            closed: false,
            repository,
        }
    }

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn on_load(&mut self) -> DispatchResult<()> {
        match self.repository.load(&self.id)? {
            Some(snapshot) => {
                self.state = snapshot.state;
                self.closed = snapshot.closed;
                debug!(item_id = %self.id, state = self.state, "item rehydrated");
            }
            None => {
                self.state = INITIAL_STATE;
                self.closed = false;
                debug!(item_id = %self.id, "item loaded with defaults");
            }
        }
        Ok(())
    }

    fn routes() -> Routes<Self> {
        Routes::<Self>::new()
            .command(Self::open)
            .command(Self::close)
            .command(Self::persist)
            .query(Self::is_closed)
            .query(Self::current_state)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
