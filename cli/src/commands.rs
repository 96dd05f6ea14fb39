//! Admin operations over a running [`CollectionStore`].
//!
//! Every command returns the JSON it wants printed. Mutations wait for the
//! collection's save to settle, so a command only succeeds once the
//! backing store holds the change.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Value, json};
use store::views::{self, Stats};
use store::{Collection, CollectionStore, PendingSave, Record, SaveOutcome, StoreError};
use time::OffsetDateTime;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("record payload must be a JSON object")]
    NotAnObject,
    #[error("invalid {collection} id {id:?}")]
    InvalidId { collection: Collection, id: String },
    #[error("saving {collection} failed: {message}")]
    SaveFailed { collection: Collection, message: String },
    #[error("reset replaces every collection with seed data; pass --yes to confirm")]
    ConfirmationRequired,
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// SAVES
// =============================================================================

/// Wait for `pending` and turn a failed write into an error.
///
/// # Errors
///
/// Returns [`CliError::SaveFailed`] if the backing store rejected the write.
pub async fn settle(pending: PendingSave) -> Result<(), CliError> {
    let collection = pending.collection();
    match pending.outcome().await {
        SaveOutcome::Persisted => Ok(()),
        SaveOutcome::Deferred => {
            warn!(%collection, "save deferred; change kept in memory only");
            Ok(())
        }
        SaveOutcome::RetryableFailure(message) | SaveOutcome::PermanentFailure(message) => {
            Err(CliError::SaveFailed { collection, message })
        }
    }
}

/// Settle every save, reporting the first failure after all have finished.
///
/// # Errors
///
/// Returns the first [`CliError::SaveFailed`].
pub async fn settle_all(pending: Vec<PendingSave>) -> Result<(), CliError> {
    let mut first_failure = None;
    for save in pending {
        if let Err(e) = settle(save).await {
            warn!(error = %e, "save failed");
            first_failure.get_or_insert(e);
        }
    }
    first_failure.map_or(Ok(()), Err)
}

/// Wait for the seed writes queued at startup. A failure is logged and
/// otherwise ignored: the seed data is already in memory and the next
/// mutation of that collection saves it again.
pub async fn settle_startup(pending: Vec<PendingSave>) {
    for save in pending {
        let collection = save.collection();
        let outcome = save.outcome().await;
        if outcome.is_failure() {
            warn!(%collection, ?outcome, "seed data not persisted at startup");
        }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// # Errors
///
/// Returns [`CliError::InvalidId`] if `raw` is not a valid id for `T`.
pub fn parse_id<T: Record>(raw: &str) -> Result<T::Id, CliError> {
    T::Id::from_str(raw.trim()).map_err(|_| CliError::InvalidId { collection: T::COLLECTION, id: raw.to_owned() })
}

/// Decode a record from `data`. A payload without an `id` gets `fallback`,
/// or a fresh timestamp id when there is no fallback.
///
/// # Errors
///
/// Returns an error if `data` is not a JSON object or does not decode as `T`.
pub fn record_from_json<T: Record>(data: &str, fallback: Option<T::Id>) -> Result<T, CliError> {
    let mut value: Value = serde_json::from_str(data)?;
    let Some(map) = value.as_object_mut() else {
        return Err(CliError::NotAnObject);
    };
    if !map.contains_key("id") {
        let id = fallback.unwrap_or_else(T::next_id);
        map.insert("id".to_owned(), serde_json::to_value(id)?);
    }
    Ok(serde_json::from_value(value)?)
}

// =============================================================================
// RECORD COMMANDS
// =============================================================================

/// # Errors
///
/// Returns an error if a record cannot be encoded.
pub fn list<T: Record>(store: &CollectionStore) -> Result<Value, CliError> {
    Ok(serde_json::to_value(store.all::<T>())?)
}

/// # Errors
///
/// Returns an error for an unparsable or unknown id.
pub fn show<T: Record>(store: &CollectionStore, raw_id: &str) -> Result<Value, CliError> {
    let id = parse_id::<T>(raw_id)?;
    let record = store.find::<T>(&id).ok_or_else(|| not_found::<T>(&id))?;
    Ok(serde_json::to_value(record)?)
}

/// # Errors
///
/// Returns an error for an invalid payload or a failed save.
pub async fn add<T: Record>(store: &CollectionStore, data: &str) -> Result<Value, CliError> {
    let record: T = record_from_json(data, None)?;
    let pending = store.add(record.clone())?;
    settle(pending).await?;
    info!(collection = %T::COLLECTION, id = %record.id(), "record added");
    Ok(serde_json::to_value(record)?)
}

/// Replace the record `raw_id` with `data`. The payload may omit its `id`.
///
/// # Errors
///
/// Returns an error for an unknown id, an invalid payload or a failed save.
pub async fn update<T: Record>(store: &CollectionStore, raw_id: &str, data: &str) -> Result<Value, CliError> {
    let id = parse_id::<T>(raw_id)?;
    let old = store.find::<T>(&id).ok_or_else(|| not_found::<T>(&id))?;
    let new: T = record_from_json(data, Some(id))?;
    let pending = store.update(&old, new.clone())?;
    settle(pending).await?;
    info!(collection = %T::COLLECTION, id = %new.id(), "record updated");
    Ok(serde_json::to_value(new)?)
}

/// # Errors
///
/// Returns an error for an unparsable id or a failed save.
pub async fn delete<T: Record>(store: &CollectionStore, raw_id: &str) -> Result<Value, CliError> {
    let id = parse_id::<T>(raw_id)?;
    let existed = store.find::<T>(&id).is_some();
    settle(store.delete_by_id::<T>(&id)).await?;
    info!(collection = %T::COLLECTION, %id, existed, "record deleted");
    Ok(json!({ "deleted": existed }))
}

fn not_found<T: Record>(id: &T::Id) -> CliError {
    CliError::Store(StoreError::NotFound { collection: T::COLLECTION, id: id.to_string() })
}

// =============================================================================
// WHOLE-STORE COMMANDS
// =============================================================================

/// # Errors
///
/// Returns [`CliError::ConfirmationRequired`] without `confirmed`, or the
/// first failed save.
pub async fn reset(store: &CollectionStore, confirmed: bool) -> Result<Value, CliError> {
    if !confirmed {
        return Err(CliError::ConfirmationRequired);
    }
    settle_all(store.reset()).await?;
    Ok(serde_json::to_value(Stats::of(&store.snapshot()))?)
}

/// Write a dated backup of every collection into `dir`.
///
/// # Errors
///
/// Returns an error if the backup cannot be encoded or written.
pub fn export(store: &CollectionStore, dir: &Path, now: OffsetDateTime) -> Result<PathBuf, CliError> {
    let text = views::backup_json(&store.snapshot())?;
    let path = dir.join(views::backup_file_name(now));
    std::fs::write(&path, text).map_err(|source| CliError::Io { path: path.clone(), source })?;
    info!(path = %path.display(), "backup written");
    Ok(path)
}

/// # Errors
///
/// Returns an error if the timeline cannot be encoded.
pub fn timeline(store: &CollectionStore) -> Result<Value, CliError> {
    Ok(serde_json::to_value(views::timeline(&store.snapshot()))?)
}

/// # Errors
///
/// Returns an error if the counts cannot be encoded.
pub fn stats(store: &CollectionStore) -> Result<Value, CliError> {
    Ok(serde_json::to_value(Stats::of(&store.snapshot()))?)
}

/// # Errors
///
/// Returns an error if the hits cannot be encoded.
pub fn search(store: &CollectionStore, query: &str) -> Result<Value, CliError> {
    Ok(serde_json::to_value(views::search(&store.snapshot(), query))?)
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
