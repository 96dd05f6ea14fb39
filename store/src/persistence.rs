//! Persistence service — one sequential save worker per collection.
//!
//! DESIGN
//! ======
//! Each collection gets an unbounded queue drained by its own background
//! task, so saves of one collection never overlap and land in the order
//! the mutations happened. Snapshots that pile up while a write is in
//! flight are coalesced: only the newest is written, and every waiting
//! caller is told the outcome of that write.
//!
//! ERROR HANDLING
//! ==============
//! A failed write is logged and reported through [`SaveOutcome`]; it is
//! never retried here and never rolls back the in-memory mutation. The
//! next successful save of the same collection converges the backing
//! store.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::backend::BackingStore;
use crate::model::Collection;

// =============================================================================
// OUTCOME
// =============================================================================

/// What happened to the persistence half of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The backing store holds the snapshot (or a newer one).
    Persisted,
    /// The store was not Ready yet; the change was applied in memory only
    /// and will be replaced by the startup load.
    Deferred,
    /// The write failed but may succeed on a later save.
    RetryableFailure(String),
    /// The write failed and repeating it will not help.
    PermanentFailure(String),
}

impl SaveOutcome {
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::RetryableFailure(_) | Self::PermanentFailure(_))
    }
}

/// Handle on a queued save. Awaiting it is optional; dropping it leaves
/// the save running.
#[derive(Debug)]
pub struct PendingSave {
    collection: Collection,
    state: PendingState,
}

#[derive(Debug)]
enum PendingState {
    Resolved(SaveOutcome),
    Waiting(oneshot::Receiver<SaveOutcome>),
}

impl PendingSave {
    pub(crate) fn resolved(collection: Collection, outcome: SaveOutcome) -> Self {
        Self { collection, state: PendingState::Resolved(outcome) }
    }

    #[must_use]
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Wait for the save to finish.
    pub async fn outcome(self) -> SaveOutcome {
        match self.state {
            PendingState::Resolved(outcome) => outcome,
            PendingState::Waiting(rx) => rx
                .await
                .unwrap_or_else(|_| SaveOutcome::PermanentFailure("save worker stopped".into())),
        }
    }
}

// =============================================================================
// WORKERS
// =============================================================================

struct SaveJob {
    records: Vec<Value>,
    reply: oneshot::Sender<SaveOutcome>,
}

/// Queue senders for every collection's save worker.
pub(crate) struct SaveQueues {
    senders: HashMap<Collection, mpsc::UnboundedSender<SaveJob>>,
}

impl SaveQueues {
    /// Spawn one worker per collection. Must be called inside a tokio runtime.
    pub(crate) fn spawn(backend: &Arc<dyn BackingStore>) -> Self {
        let senders = Collection::ALL
            .into_iter()
            .map(|collection| {
                let (tx, rx) = mpsc::unbounded_channel();
                spawn_save_worker(collection, backend.clone(), rx);
                (collection, tx)
            })
            .collect();
        Self { senders }
    }

    /// Queue a snapshot of `collection` for writing.
    pub(crate) fn enqueue(&self, collection: Collection, records: Vec<Value>) -> PendingSave {
        let Some(tx) = self.senders.get(&collection) else {
            return PendingSave::resolved(collection, SaveOutcome::PermanentFailure("no save worker".into()));
        };

        let (reply, rx) = oneshot::channel();
        match tx.send(SaveJob { records, reply }) {
            Ok(()) => PendingSave { collection, state: PendingState::Waiting(rx) },
            Err(_) => {
                warn!(%collection, "save queue closed; dropping snapshot");
                PendingSave::resolved(collection, SaveOutcome::PermanentFailure("save worker stopped".into()))
            }
        }
    }
}

fn spawn_save_worker(
    collection: Collection,
    backend: Arc<dyn BackingStore>,
    mut rx: mpsc::UnboundedReceiver<SaveJob>,
) {
    tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut waiting = vec![first.reply];
            let mut records = first.records;

            // EDGE: anything queued behind this job is newer; write only the latest.
            while let Ok(next) = rx.try_recv() {
                waiting.push(next.reply);
                records = next.records;
            }
            if waiting.len() > 1 {
                debug!(%collection, coalesced = waiting.len(), "coalescing queued saves");
            }

            let outcome = write_snapshot(backend.as_ref(), collection, &records).await;
            for reply in waiting {
                let _ = reply.send(outcome.clone());
            }
        }
        debug!(%collection, "save worker stopped");
    });
}

async fn write_snapshot(backend: &dyn BackingStore, collection: Collection, records: &[Value]) -> SaveOutcome {
    match backend.save(collection, records).await {
        Ok(()) => {
            debug!(%collection, count = records.len(), "collection persisted");
            SaveOutcome::Persisted
        }
        Err(e) if e.retryable() => {
            warn!(error = %e, %collection, count = records.len(), "collection save failed; will converge on next save");
            SaveOutcome::RetryableFailure(e.to_string())
        }
        Err(e) => {
            warn!(error = %e, %collection, count = records.len(), "collection save failed permanently");
            SaveOutcome::PermanentFailure(e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
