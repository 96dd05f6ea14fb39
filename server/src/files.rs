//! On-disk storage for the collection service.
//!
//! Each collection is one pretty-printed JSON file, `{name}.json`, in the
//! storage directory. Writes go to a temporary sibling first and are then
//! renamed over the target, so a reader never sees a half-written file.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use store::Collection;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("invalid collection name: {0:?}")]
    InvalidName(String),
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FileStoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

/// Handle on the storage directory. Clone to share between handlers.
#[derive(Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
    tmp_seq: Arc<AtomicU64>,
}

impl FileStore {
    /// Open `root`, creating it and an empty `[]` file for every known
    /// collection that has none yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or an initial file cannot be
    /// created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| FileStoreError::io(&root, e))?;

        for collection in Collection::ALL {
            let path = root.join(file_name(collection.name()));
            if path.exists() {
                continue;
            }
            std::fs::write(&path, "[]").map_err(|e| FileStoreError::io(&path, e))?;
            info!(path = %path.display(), "created empty collection file");
        }

        Ok(Self { root: Arc::new(root), tmp_seq: Arc::new(AtomicU64::new(0)) })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::InvalidName`] unless `name` is non-empty
    /// and made of ASCII alphanumerics, `_` and `-`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, FileStoreError> {
        validate_name(name)?;
        Ok(self.root.join(file_name(name)))
    }

    /// Stored content of `name`. A missing or unparsable file reads as `[]`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or an unreadable file.
    pub async fn read(&self, name: &str) -> Result<Value, FileStoreError> {
        let path = self.path_for(name)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Value::Array(Vec::new())),
            Err(e) => return Err(FileStoreError::io(&path, e)),
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "unparsable collection file; serving []");
                Ok(Value::Array(Vec::new()))
            }
        }
    }

    /// Replace the content of `name` with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a failed write.
    pub async fn write(&self, name: &str, records: &[Value]) -> Result<(), FileStoreError> {
        let path = self.path_for(name)?;
        let text = serde_json::to_string_pretty(records)?;

        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = self.root.join(format!(".{name}.{seq}.tmp"));
        if let Err(e) = tokio::fs::write(&tmp, text).await {
            return Err(FileStoreError::io(&tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(FileStoreError::io(&path, e));
        }

        debug!(name, count = records.len(), "collection file written");
        Ok(())
    }
}

fn file_name(name: &str) -> String {
    format!("{name}.json")
}

fn validate_name(name: &str) -> Result<(), FileStoreError> {
    let valid = !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid { Ok(()) } else { Err(FileStoreError::InvalidName(name.to_owned())) }
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;
