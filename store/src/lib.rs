//! Content store for the heritage site.
//!
//! SYSTEM CONTEXT
//! ==============
//! Gallery, timeline, quiz and map pages read five record collections, and
//! the admin editors mutate them. This crate owns those collections in
//! memory ([`CollectionStore`]), loads them from a backing store at startup,
//! and writes each collection back after every change through one of two
//! interchangeable adapters: a local directory of per-collection entries or
//! the remote file-store service in the `server` crate.

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod persistence;
pub mod seed;
pub mod store;
pub mod views;

pub use backend::BackingStore;
pub use config::StoreConfig;
pub use error::{StoreError, ValidationError};
pub use model::{
    Collection, Collections, Hero, HistoricalEvent, Period, Place, PlaceType, QuizQuestion, Record, WarHero,
};
pub use persistence::{PendingSave, SaveOutcome};
pub use store::{CollectionStore, StoreStatus};
