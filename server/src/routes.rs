//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The remote adapter in the `store` crate reads and replaces whole
//! collections through `/api/data/{name}`. There is no patching and no
//! version check; the last write wins.

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::files::{FileStore, FileStoreError};

/// Collections may carry inline image data.
const BODY_LIMIT_BYTES: usize = 32 * 1024 * 1024;

pub fn app(files: FileStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/data/{name}", get(load_collection).post(save_collection))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(files)
}

/// `GET /api/data/{name}` — the stored array, `[]` when there is none.
async fn load_collection(State(files): State<FileStore>, Path(name): Path<String>) -> Result<Json<Value>, StatusCode> {
    files.read(&name).await.map(Json).map_err(file_error_to_status)
}

/// `POST /api/data/{name}` — replace the stored array.
async fn save_collection(
    State(files): State<FileStore>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let Value::Array(records) = body else {
        return Err(StatusCode::BAD_REQUEST);
    };
    files.write(&name, &records).await.map_err(file_error_to_status)?;
    info!(%name, count = records.len(), "collection saved");
    Ok(Json(json!({ "success": true })))
}

pub(crate) fn file_error_to_status(err: FileStoreError) -> StatusCode {
    match err {
        FileStoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
        FileStoreError::Io { .. } | FileStoreError::Encode(_) => {
            error!(error = %err, "collection file access failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
