//! Local adapter: one text entry per collection in a directory.
//!
//! Entries are keyed `data_<collection>` and hold the compact JSON array.
//! I/O is plain synchronous `std::fs`; entries are small and the caller
//! is a single editor. Writes land in a temporary sibling that is renamed
//! over the entry, so an interrupted write leaves the previous entry intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{BackingStore, decode_array};
use crate::error::StoreError;
use crate::model::Collection;

pub const KEY_PREFIX: &str = "data_";

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) the entry directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io { path: root.clone(), source })?;
        Ok(Self { root })
    }

    /// Storage key for a collection, e.g. `data_heroes`.
    #[must_use]
    pub fn key(collection: Collection) -> String {
        format!("{KEY_PREFIX}{}", collection.name())
    }

    #[must_use]
    pub fn entry_path(&self, collection: Collection) -> PathBuf {
        self.root.join(Self::key(collection))
    }

    fn read_entry(&self, collection: Collection) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(collection);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Scratch file for an in-flight write. Each collection has one save
    /// worker, so one scratch name per collection is enough.
    fn temp_path(&self, collection: Collection) -> PathBuf {
        self.root.join(format!(".{}.tmp", Self::key(collection)))
    }

    fn write_entry(&self, collection: Collection, text: &str) -> Result<(), StoreError> {
        let path = self.entry_path(collection);
        let tmp = self.temp_path(collection);
        fs::write(&tmp, text).map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::Io { path, source });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BackingStore for LocalStore {
    async fn load(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        match self.read_entry(collection)? {
            Some(text) => decode_array(collection, &text),
            None => {
                debug!(%collection, "no local entry yet");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, collection: Collection, records: &[Value]) -> Result<(), StoreError> {
        let text = serde_json::to_string(records)?;
        self.write_entry(collection, &text)
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
