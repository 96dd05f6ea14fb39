//! Record types for the five content collections.
//!
//! DESIGN
//! ======
//! Wire names follow the JSON the site has always persisted: camelCase
//! fields, lowercase enum values, Place's kind stored as `type`. Decoding
//! is the schema check at the load boundary: a record missing a required
//! field, or a quiz question without exactly four options, fails to decode
//! and is dropped by the store. [`Record::validate`] covers the invariants
//! serde cannot express.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, ValidationError};
use crate::seed;

// =============================================================================
// COLLECTION NAMES
// =============================================================================

/// One of the five named collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "heroes")]
    Heroes,
    #[serde(rename = "warHeroes")]
    WarHeroes,
    #[serde(rename = "places")]
    Places,
    #[serde(rename = "quiz")]
    Quiz,
    #[serde(rename = "timeline")]
    Timeline,
}

impl Collection {
    pub const ALL: [Collection; 5] = [Self::Heroes, Self::WarHeroes, Self::Places, Self::Quiz, Self::Timeline];

    /// Stable name used as the storage key and the file-store resource name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Heroes => "heroes",
            Self::WarHeroes => "warHeroes",
            Self::Places => "places",
            Self::Quiz => "quiz",
            Self::Timeline => "timeline",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| StoreError::UnknownCollection(s.to_owned()))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Historical period a hero belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Early,
    Modern,
}

/// A public figure shown in the main gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: String,
    pub name: String,
    /// Free-text life span, e.g. `"1490-1551"` or `"c. 1520 – 1580"`.
    pub years: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarHero {
    pub id: String,
    pub name: String,
    pub years: String,
    pub title: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    Castle,
    Memorial,
    Religious,
    Historical,
}

/// A map marker. `x`/`y` are positions on the map artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub url: String,
    pub image_url: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: PlaceType,
}

/// A quiz question with exactly four answer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: i64,
    pub question: String,
    pub options: [String; 4],
    pub correct_answer: u8,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl QuizQuestion {
    /// Whether `choice` (an index into `options`) is the right answer.
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == usize::from(self.correct_answer)
    }
}

/// A dated entry on the combined timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// =============================================================================
// COLLECTIONS
// =============================================================================

/// All five collections together. Serializes in the backup-file shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    pub heroes: Vec<Hero>,
    pub war_heroes: Vec<WarHero>,
    pub places: Vec<Place>,
    pub quiz: Vec<QuizQuestion>,
    pub events: Vec<HistoricalEvent>,
}

impl Collections {
    /// Seed defaults for every collection.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            heroes: seed::heroes(),
            war_heroes: seed::war_heroes(),
            places: seed::places(),
            quiz: seed::quiz(),
            events: seed::events(),
        }
    }

    /// Encode one collection as the JSON array elements that get persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be represented as JSON.
    pub fn encode(&self, collection: Collection) -> Result<Vec<serde_json::Value>, serde_json::Error> {
        match collection {
            Collection::Heroes => encode_records(&self.heroes),
            Collection::WarHeroes => encode_records(&self.war_heroes),
            Collection::Places => encode_records(&self.places),
            Collection::Quiz => encode_records(&self.quiz),
            Collection::Timeline => encode_records(&self.events),
        }
    }

    /// Number of records in one collection.
    #[must_use]
    pub fn len_of(&self, collection: Collection) -> usize {
        match collection {
            Collection::Heroes => self.heroes.len(),
            Collection::WarHeroes => self.war_heroes.len(),
            Collection::Places => self.places.len(),
            Collection::Quiz => self.quiz.len(),
            Collection::Timeline => self.events.len(),
        }
    }
}

fn encode_records<T: Serialize>(records: &[T]) -> Result<Vec<serde_json::Value>, serde_json::Error> {
    records.iter().map(serde_json::to_value).collect()
}

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// Shared shape of the five record types. The collection store is generic
/// over this trait, so `add`/`update`/`delete` are written once.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: PartialEq + Clone + fmt::Display + FromStr + Serialize + DeserializeOwned + Send + Sync;

    const COLLECTION: Collection;

    fn id(&self) -> &Self::Id;

    /// A fresh timestamp-derived identifier.
    fn next_id() -> Self::Id;

    /// Field-level invariants beyond what decoding enforces.
    ///
    /// # Errors
    ///
    /// Returns the first broken invariant.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn slot(collections: &Collections) -> &Vec<Self>;

    fn slot_mut(collections: &mut Collections) -> &mut Vec<Self>;

    fn seed() -> Vec<Self>;
}

fn non_empty_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() { Err(ValidationError::EmptyId) } else { Ok(()) }
}

impl Record for Hero {
    type Id = String;
    const COLLECTION: Collection = Collection::Heroes;

    fn id(&self) -> &String {
        &self.id
    }

    fn next_id() -> String {
        timestamp_id().to_string()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        non_empty_id(&self.id)
    }

    fn slot(collections: &Collections) -> &Vec<Self> {
        &collections.heroes
    }

    fn slot_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.heroes
    }

    fn seed() -> Vec<Self> {
        seed::heroes()
    }
}

impl Record for WarHero {
    type Id = String;
    const COLLECTION: Collection = Collection::WarHeroes;

    fn id(&self) -> &String {
        &self.id
    }

    fn next_id() -> String {
        timestamp_id().to_string()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        non_empty_id(&self.id)
    }

    fn slot(collections: &Collections) -> &Vec<Self> {
        &collections.war_heroes
    }

    fn slot_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.war_heroes
    }

    fn seed() -> Vec<Self> {
        seed::war_heroes()
    }
}

impl Record for Place {
    type Id = String;
    const COLLECTION: Collection = Collection::Places;

    fn id(&self) -> &String {
        &self.id
    }

    fn next_id() -> String {
        timestamp_id().to_string()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        non_empty_id(&self.id)?;
        if !self.x.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate { axis: "x" });
        }
        if !self.y.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate { axis: "y" });
        }
        Ok(())
    }

    fn slot(collections: &Collections) -> &Vec<Self> {
        &collections.places
    }

    fn slot_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.places
    }

    fn seed() -> Vec<Self> {
        seed::places()
    }
}

impl Record for QuizQuestion {
    type Id = i64;
    const COLLECTION: Collection = Collection::Quiz;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn next_id() -> i64 {
        timestamp_id()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if usize::from(self.correct_answer) >= self.options.len() {
            return Err(ValidationError::AnswerOutOfRange { index: self.correct_answer });
        }
        Ok(())
    }

    fn slot(collections: &Collections) -> &Vec<Self> {
        &collections.quiz
    }

    fn slot_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.quiz
    }

    fn seed() -> Vec<Self> {
        seed::quiz()
    }
}

impl Record for HistoricalEvent {
    type Id = i64;
    const COLLECTION: Collection = Collection::Timeline;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn next_id() -> i64 {
        timestamp_id()
    }

    fn slot(collections: &Collections) -> &Vec<Self> {
        &collections.events
    }

    fn slot_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.events
    }

    fn seed() -> Vec<Self> {
        seed::events()
    }
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

static LAST_TIMESTAMP_ID: AtomicI64 = AtomicI64::new(0);

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Milliseconds since the Unix epoch, bumped when two calls land in the
/// same millisecond so an identifier is never handed out twice.
#[must_use]
pub fn timestamp_id() -> i64 {
    let now = now_ms();
    let mut last = LAST_TIMESTAMP_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
