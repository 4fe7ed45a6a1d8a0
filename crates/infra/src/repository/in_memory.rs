use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tellask_core::{Identity, Repository, RepositoryError};

/// A snapshot as held by the store: JSON payload plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// Canonical identity of the aggregate.
    pub key: String,
    /// Number of saves for this key, starting at 1.
    pub revision: u64,
    pub saved_at: DateTime<Utc>,
    pub payload: JsonValue,
}

/// In-memory snapshot repository keyed by canonical identity.
///
/// Intended for tests/dev. Clones share the same backing map, so a registry
/// can hand every aggregate a fresh handle onto one store.
pub struct InMemoryRepository<Id, S> {
    snapshots: Arc<RwLock<HashMap<String, StoredSnapshot>>>,
    _marker: PhantomData<fn() -> (Id, S)>,
}

impl<Id, S> InMemoryRepository<Id, S> {
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(HashMap::new())),
            _marker: PhantomData,
        }
    }

    /// Number of stored records. A poisoned store is `Unavailable`, never empty.
    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.read()?.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredSnapshot>>, RepositoryError> {
        self.snapshots.read().map_err(|_| poisoned())
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("lock poisoned".to_string())
}

impl<Id: Identity, S> InMemoryRepository<Id, S> {
    /// Raw stored record for `id`, if any.
    pub fn stored(&self, id: &Id) -> Result<Option<StoredSnapshot>, RepositoryError> {
        Ok(self.read()?.get(&id.canonical()).cloned())
    }
}

impl<Id, S> Default for InMemoryRepository<Id, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id, S> Clone for InMemoryRepository<Id, S> {
    fn clone(&self) -> Self {
        Self {
            snapshots: Arc::clone(&self.snapshots),
            _marker: PhantomData,
        }
    }
}

impl<Id, S> fmt::Debug for InMemoryRepository<Id, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("poisoned", &self.snapshots.is_poisoned())
            .finish_non_exhaustive()
    }
}

impl<Id, S> Repository for InMemoryRepository<Id, S>
where
    Id: Identity,
    S: Serialize + DeserializeOwned,
{
    type Id = Id;
    type Snapshot = S;

    fn load(&self, id: &Id) -> Result<Option<S>, RepositoryError> {
        let Some(stored) = self.stored(id)? else {
            return Ok(None);
        };
        serde_json::from_value(stored.payload)
            .map(Some)
            .map_err(|e| RepositoryError::Serialization(format!("{}: {e}", stored.key)))
    }

    fn save(&self, id: &Id, snapshot: &S) -> Result<(), RepositoryError> {
        let key = id.canonical();
        let payload = serde_json::to_value(snapshot)
            .map_err(|e| RepositoryError::Serialization(format!("{key}: {e}")))?;

        let mut snapshots = self.snapshots.write().map_err(|_| poisoned())?;

        let revision = snapshots.get(&key).map(|s| s.revision).unwrap_or(0) + 1;
        snapshots.insert(
            key.clone(),
            StoredSnapshot {
                key,
                revision,
                saved_at: Utc::now(),
                payload,
            },
        );
        Ok(())
    }
}
