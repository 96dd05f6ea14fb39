//! Collection store — the in-memory source of truth for all five collections.
//!
//! DESIGN
//! ======
//! `CollectionStore` is an explicitly constructed handle (clone it to share)
//! that consumers receive by injection. Mutations are synchronous against
//! memory and immediately visible to the next read; persistence of the
//! affected collection is queued on that collection's save worker and
//! reported through a [`PendingSave`] the caller may await or drop.
//!
//! LIFECYCLE
//! =========
//! `Uninitialized` (seed data in memory, nothing persisted) -> `Loading`
//! (one concurrent load per collection) -> `Ready` for the rest of the
//! process. Load failures never block readiness: a collection whose load
//! fails or yields no valid records falls back to seed data, which is then
//! written back so the backing store is never left empty.
//!
//! Snapshots are queued while the collection lock is held, so the save
//! queue sees mutations in the order they were applied.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{info, warn};

use crate::backend::BackingStore;
use crate::error::StoreError;
use crate::model::{Collection, Collections, Hero, HistoricalEvent, Place, QuizQuestion, Record, WarHero};
use crate::persistence::{PendingSave, SaveOutcome, SaveQueues};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Uninitialized,
    Loading,
    Ready,
}

/// Shared handle on the collection store.
#[derive(Clone)]
pub struct CollectionStore {
    inner: Arc<Inner>,
}

struct Inner {
    collections: RwLock<Collections>,
    status: RwLock<StoreStatus>,
    backend: Arc<dyn BackingStore>,
    queues: SaveQueues,
}

impl CollectionStore {
    /// Build a store over `backend`, holding seed data until [`initialize`]
    /// runs. Spawns the save workers, so it must be called inside a tokio
    /// runtime.
    ///
    /// [`initialize`]: CollectionStore::initialize
    #[must_use]
    pub fn new(backend: Arc<dyn BackingStore>) -> Self {
        let queues = SaveQueues::spawn(&backend);
        Self {
            inner: Arc::new(Inner {
                collections: RwLock::new(Collections::seeded()),
                status: RwLock::new(StoreStatus::Uninitialized),
                backend,
                queues,
            }),
        }
    }

    #[must_use]
    pub fn status(&self) -> StoreStatus {
        *self.inner.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.collections.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: StoreStatus) {
        *self.inner.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    // =========================================================================
    // STARTUP
    // =========================================================================

    /// Load every collection and move to `Ready`.
    ///
    /// Returns the pending writes of collections that fell back to seed
    /// data. Only the first call does anything; later calls return an
    /// empty list.
    pub async fn initialize(&self) -> Vec<PendingSave> {
        {
            let mut status = self.inner.status.write().unwrap_or_else(PoisonError::into_inner);
            if *status != StoreStatus::Uninitialized {
                return Vec::new();
            }
            *status = StoreStatus::Loading;
        }
        info!("loading collections");

        let backend = self.inner.backend.as_ref();
        let (heroes, war_heroes, places, quiz, events) = tokio::join!(
            load_records::<Hero>(backend),
            load_records::<WarHero>(backend),
            load_records::<Place>(backend),
            load_records::<QuizQuestion>(backend),
            load_records::<HistoricalEvent>(backend),
        );

        let mut collections = self.write();
        let mut seeded = Vec::new();
        install(&mut collections, heroes, &mut seeded);
        install(&mut collections, war_heroes, &mut seeded);
        install(&mut collections, places, &mut seeded);
        install(&mut collections, quiz, &mut seeded);
        install(&mut collections, events, &mut seeded);
        self.set_status(StoreStatus::Ready);

        info!(
            heroes = collections.heroes.len(),
            war_heroes = collections.war_heroes.len(),
            places = collections.places.len(),
            quiz = collections.quiz.len(),
            events = collections.events.len(),
            seeded = seeded.len(),
            "collection store ready"
        );

        seeded
            .into_iter()
            .map(|collection| self.enqueue(&collections, collection))
            .collect()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Every record of `T`'s collection, in stored order.
    #[must_use]
    pub fn all<T: Record>(&self) -> Vec<T> {
        T::slot(&self.read()).clone()
    }

    #[must_use]
    pub fn find<T: Record>(&self, id: &T::Id) -> Option<T> {
        T::slot(&self.read()).iter().find(|r| r.id() == id).cloned()
    }

    #[must_use]
    pub fn count<T: Record>(&self) -> usize {
        T::slot(&self.read()).len()
    }

    /// A copy of all five collections.
    #[must_use]
    pub fn snapshot(&self) -> Collections {
        self.read().clone()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Append `record`. Identifier uniqueness is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the record fails validation; the
    /// collection is left unchanged.
    pub fn add<T: Record>(&self, record: T) -> Result<PendingSave, StoreError> {
        record.validate()?;
        let mut collections = self.write();
        T::slot_mut(&mut collections).push(record);
        Ok(self.persist(&collections, T::COLLECTION))
    }

    /// Replace the record whose identifier matches `old` with `new`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if `new` fails validation and
    /// [`StoreError::NotFound`] if no record has `old`'s identifier. Either
    /// way the collection is left unchanged and nothing is saved.
    pub fn update<T: Record>(&self, old: &T, new: T) -> Result<PendingSave, StoreError> {
        new.validate()?;
        let mut collections = self.write();
        let records = T::slot_mut(&mut collections);
        let Some(position) = records.iter().position(|r| r.id() == old.id()) else {
            return Err(StoreError::NotFound { collection: T::COLLECTION, id: old.id().to_string() });
        };
        records[position] = new;
        Ok(self.persist(&collections, T::COLLECTION))
    }

    /// Remove the record with `record`'s identifier. Absent is a no-op,
    /// but the collection is still saved.
    pub fn delete<T: Record>(&self, record: &T) -> PendingSave {
        self.delete_by_id::<T>(record.id())
    }

    pub fn delete_by_id<T: Record>(&self, id: &T::Id) -> PendingSave {
        let mut collections = self.write();
        T::slot_mut(&mut collections).retain(|r| r.id() != id);
        self.persist(&collections, T::COLLECTION)
    }

    /// Replace all five collections with seed data and write all five.
    ///
    /// Persists even before `Ready`.
    pub fn reset(&self) -> Vec<PendingSave> {
        let mut collections = self.write();
        *collections = Collections::seeded();
        info!("collections reset to seed data");
        Collection::ALL
            .into_iter()
            .map(|collection| self.enqueue(&collections, collection))
            .collect()
    }

    /// Queue a save of `collection` if the store is Ready.
    fn persist(&self, collections: &Collections, collection: Collection) -> PendingSave {
        if self.status() != StoreStatus::Ready {
            return PendingSave::resolved(collection, SaveOutcome::Deferred);
        }
        self.enqueue(collections, collection)
    }

    fn enqueue(&self, collections: &Collections, collection: Collection) -> PendingSave {
        match collections.encode(collection) {
            Ok(records) => self.inner.queues.enqueue(collection, records),
            Err(e) => {
                warn!(error = %e, %collection, "collection encode failed; not saved");
                PendingSave::resolved(collection, SaveOutcome::PermanentFailure(e.to_string()))
            }
        }
    }
}

// =============================================================================
// LOAD HELPERS
// =============================================================================

/// Load and decode one collection. `None` means "use seed data".
async fn load_records<T: Record>(backend: &dyn BackingStore) -> Option<Vec<T>> {
    let collection = T::COLLECTION;
    let raw = match backend.load(collection).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, %collection, "collection load failed; using seed data");
            return None;
        }
    };

    let total = raw.len();
    let records = decode_records::<T>(raw);
    if records.len() < total {
        warn!(%collection, rejected = total - records.len(), total, "dropped invalid stored records");
    }
    if records.is_empty() { None } else { Some(records) }
}

/// Decode stored values, keeping only records that pass the schema and
/// [`Record::validate`].
pub(crate) fn decode_records<T: Record>(raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(record) => match record.validate() {
                Ok(()) => Some(record),
                Err(e) => {
                    warn!(error = %e, collection = %T::COLLECTION, "stored record failed validation");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, collection = %T::COLLECTION, "stored record failed to decode");
                None
            }
        })
        .collect()
}

fn install<T: Record>(collections: &mut Collections, loaded: Option<Vec<T>>, seeded: &mut Vec<Collection>) {
    match loaded {
        Some(records) => *T::slot_mut(collections) = records,
        None => {
            *T::slot_mut(collections) = T::seed();
            seeded.push(T::COLLECTION);
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
