//! The finance bounded context: the explicit table of aggregate families it
//! serves and the storage they share.

use std::sync::Arc;

use tracing::info;

use tellask_core::{Client, DispatchResult, Family, Registry};
use tellask_items::{Item, ItemId, ItemSnapshot, ItemsRepository};

use crate::config::ContextConfig;
use crate::repository::InMemoryRepository;
use crate::traced;

pub type ItemStore = InMemoryRepository<ItemId, ItemSnapshot>;

/// Build the finance registry. Every item instance gets its own repository
/// handle onto `items`.
pub fn registry(config: &ContextConfig, items: ItemStore) -> DispatchResult<Registry> {
    let mut registry = Registry::new(config.name.clone());

    let make_items = move || -> Arc<ItemsRepository> { Arc::new(items.clone()) };
    if config.trace_dispatch {
        registry.register_with::<Item, _, _>(make_items, traced::layer::<Item>)?;
    } else {
        registry.register::<Item, _>(make_items)?;
    }

    info!(
        context = %registry.context(),
        families = ?registry.families(),
        trace_dispatch = config.trace_dispatch,
        "bounded context ready"
    );
    Ok(registry)
}

/// Finance registry together with the stores it was wired to.
#[derive(Debug)]
pub struct Finance {
    registry: Registry,
    items: ItemStore,
}

impl Finance {
    pub fn new(config: &ContextConfig) -> DispatchResult<Self> {
        Self::with_items(config, ItemStore::new())
    }

    pub fn with_items(config: &ContextConfig, items: ItemStore) -> DispatchResult<Self> {
        let registry = registry(config, items.clone())?;
        Ok(Self { registry, items })
    }

    pub fn get<F: Family>(&self, id: F::Id) -> DispatchResult<Client<F>> {
        self.registry.get::<F>(id)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn items(&self) -> &ItemStore {
        &self.items
    }
}
