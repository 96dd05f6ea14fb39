//! Remote adapter: whole-collection reads and writes against the file store.
//!
//! `GET {base}/api/data/{name}` returns the collection's JSON array and
//! `POST {base}/api/data/{name}` replaces it. There is no patching and no
//! version check; the last write wins.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::{BackingStore, decode_array};
use crate::config::{Timeouts, normalize_base_url};
use crate::error::StoreError;
use crate::model::Collection;

pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    /// Build a client for the file store at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: normalize_base_url(base_url) })
    }

    #[must_use]
    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}/api/data/{}", self.base_url, collection.name())
    }
}

#[async_trait::async_trait]
impl BackingStore for RemoteStore {
    async fn load(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let response = self
            .http
            .get(self.collection_url(collection))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%collection, "collection not on file store yet");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(StoreError::Status { status: status.as_u16() });
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        decode_array(collection, &text)
    }

    async fn save(&self, collection: Collection, records: &[Value]) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.collection_url(collection))
            .json(records)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { status: status.as_u16() });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;
