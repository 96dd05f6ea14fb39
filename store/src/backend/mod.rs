//! Backing-store adapters.
//!
//! DESIGN
//! ======
//! The collection store only talks to [`BackingStore`]. Exactly one adapter
//! is wired in per deployment, chosen by [`open`] from [`StoreConfig`]:
//! [`local::LocalStore`] keeps one text entry per collection in a local
//! directory, [`remote::RemoteStore`] reads and replaces whole collections
//! on the file-store service over HTTP.
//!
//! Both adapters speak in raw JSON values. Decoding into record types, and
//! dropping records that fail the schema, happens in the store so the
//! check is written once.

pub mod local;
pub mod remote;

use std::sync::Arc;

use serde_json::Value;

use crate::config::{BackendKind, StoreConfig};
use crate::error::StoreError;
use crate::model::Collection;

/// Uniform persistence contract for one deployment.
#[async_trait::async_trait]
pub trait BackingStore: Send + Sync {
    /// Fetch the full content of a collection.
    ///
    /// A collection that has never been written is `Ok(vec![])`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store is unreachable or the stored
    /// content is not a JSON array.
    async fn load(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Replace the full content of a collection.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write does not complete.
    async fn save(&self, collection: Collection, records: &[Value]) -> Result<(), StoreError>;
}

/// Build the adapter selected by `config`.
///
/// # Errors
///
/// Returns an error if the local directory cannot be created or the HTTP
/// client cannot be built.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn BackingStore>, StoreError> {
    match config.backend {
        BackendKind::Local => Ok(Arc::new(local::LocalStore::open(&config.local_dir)?)),
        BackendKind::Remote => Ok(Arc::new(remote::RemoteStore::new(&config.remote_url, config.timeouts)?)),
    }
}

/// Parse stored text as the JSON array of one collection.
pub(crate) fn decode_array(collection: Collection, text: &str) -> Result<Vec<Value>, StoreError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(StoreError::Decode {
            collection,
            message: format!("expected a JSON array, found {}", json_kind(&other)),
        }),
        Err(e) => Err(StoreError::Decode { collection, message: e.to_string() }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
