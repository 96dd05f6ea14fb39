//! Store errors.
//!
//! Adapters report failures as [`StoreError`]; the collection store decides
//! what to do with them (degrade a load to seed data, report a save as a
//! [`crate::SaveOutcome`]). Nothing here is ever fatal to a caller.

use std::path::PathBuf;

use crate::model::Collection;

// =============================================================================
// VALIDATION
// =============================================================================

/// A record that decodes but breaks a field-level invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// String identifiers must be non-empty.
    #[error("identifier is empty")]
    EmptyId,

    /// `correctAnswer` must index into the four options.
    #[error("correct answer index {index} is outside 0..=3")]
    AnswerOutOfRange { index: u8 },

    /// Map coordinates must be finite numbers.
    #[error("coordinate {axis} is not a finite number")]
    NonFiniteCoordinate { axis: &'static str },
}

// =============================================================================
// STORE ERROR
// =============================================================================

/// Errors produced by backing-store adapters and store mutations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a local storage entry failed.
    #[error("storage I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request to the file store failed before a response arrived.
    #[error("file store request failed: {0}")]
    Request(String),

    /// The file store returned a non-success HTTP status.
    #[error("file store responded with status {status}")]
    Status { status: u16 },

    /// Persisted content for a collection is not a JSON array.
    #[error("malformed {collection} payload: {message}")]
    Decode { collection: Collection, message: String },

    /// Records could not be encoded to JSON.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// A collection name did not match any known collection.
    #[error("unknown collection `{0}`")]
    UnknownCollection(String),

    /// A record failed validation and was not applied.
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),

    /// An update named an identifier that is not in the collection.
    #[error("no {collection} record with id {id}")]
    NotFound { collection: Collection, id: String },
}

impl StoreError {
    /// Whether repeating the same operation later could succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Request(_) | Self::Status { status: 429 | 500..=599 })
    }
}
