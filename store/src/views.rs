//! Read-side derivations used by the public pages and the admin dashboard.
//!
//! Nothing here touches storage order: every function copies and sorts, so
//! stored collections stay in insertion order.

use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

use crate::model::{Collections, Hero, HistoricalEvent, Period, WarHero};

// =============================================================================
// YEARS
// =============================================================================

/// First 3–4 digit number in a free-text year range, or 0 if there is none.
///
/// `"1490-1551"` -> 1490, `"c. 980 – 1015"` -> 980, `"XVI ст."` -> 0.
#[must_use]
pub fn parse_year(text: &str) -> i32 {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i - start >= 3 {
            let end = start + (i - start).min(4);
            return text[start..end].parse().unwrap_or(0);
        }
    }
    0
}

/// Records with a free-text life span.
pub trait Lifespan {
    fn years(&self) -> &str;
}

impl Lifespan for Hero {
    fn years(&self) -> &str {
        &self.years
    }
}

impl Lifespan for WarHero {
    fn years(&self) -> &str {
        &self.years
    }
}

/// Copy of `people` sorted by parsed birth year (stable).
#[must_use]
pub fn sorted_by_birth_year<T: Lifespan + Clone>(people: &[T]) -> Vec<T> {
    let mut sorted = people.to_vec();
    sorted.sort_by_key(|p| parse_year(p.years()));
    sorted
}

/// Heroes sorted by birth year, optionally limited to one period.
#[must_use]
pub fn heroes_in_period(heroes: &[Hero], period: Option<Period>) -> Vec<Hero> {
    sorted_by_birth_year(heroes)
        .into_iter()
        .filter(|h| period.is_none_or(|p| h.period == p))
        .collect()
}

#[must_use]
pub fn events_by_year(events: &[HistoricalEvent]) -> Vec<HistoricalEvent> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|e| e.year);
    sorted
}

// =============================================================================
// TIMELINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineKind {
    Hero,
    WarHero,
    Event,
}

/// One row of the combined timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: String,
    pub year: i32,
    pub title: String,
    pub description: String,
    pub kind: TimelineKind,
    pub image: Option<String>,
    /// The original year text shown next to the entry.
    pub full_date: String,
}

/// Heroes, war heroes and events merged and sorted by year. Entries with
/// the same year keep collection order (heroes, war heroes, events).
#[must_use]
pub fn timeline(collections: &Collections) -> Vec<TimelineEntry> {
    let heroes = collections.heroes.iter().map(|h| TimelineEntry {
        id: h.id.clone(),
        year: parse_year(&h.years),
        title: h.name.clone(),
        description: h.title.clone(),
        kind: TimelineKind::Hero,
        image: Some(h.image.clone()),
        full_date: h.years.clone(),
    });
    let war_heroes = collections.war_heroes.iter().map(|w| TimelineEntry {
        id: w.id.clone(),
        year: parse_year(&w.years),
        title: w.name.clone(),
        description: w.title.clone(),
        kind: TimelineKind::WarHero,
        image: Some(w.image.clone()),
        full_date: w.years.clone(),
    });
    let events = collections.events.iter().map(|e| TimelineEntry {
        id: e.id.to_string(),
        year: e.year,
        title: e.title.clone(),
        description: e.description.clone(),
        kind: TimelineKind::Event,
        image: e.image.clone(),
        full_date: e.year.to_string(),
    });

    let mut entries: Vec<TimelineEntry> = heroes.chain(war_heroes).chain(events).collect();
    entries.sort_by_key(|e| e.year);
    entries
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchKind {
    Hero,
    WarHero,
    Place,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: String,
    pub name: String,
}

/// Shortest query, in characters, that [`search`] acts on.
pub const MIN_QUERY_CHARS: usize = 3;

/// Case-insensitive name search over heroes, war heroes and places.
/// Queries shorter than [`MIN_QUERY_CHARS`] after trimming match nothing.
#[must_use]
pub fn search(collections: &Collections, query: &str) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    let matches = |name: &str| name.to_lowercase().contains(&needle);

    let heroes = collections
        .heroes
        .iter()
        .filter(|h| matches(&h.name))
        .map(|h| SearchHit { kind: SearchKind::Hero, id: h.id.clone(), name: h.name.clone() });
    let war_heroes = collections
        .war_heroes
        .iter()
        .filter(|w| matches(&w.name))
        .map(|w| SearchHit { kind: SearchKind::WarHero, id: w.id.clone(), name: w.name.clone() });
    let places = collections
        .places
        .iter()
        .filter(|p| matches(&p.name))
        .map(|p| SearchHit { kind: SearchKind::Place, id: p.id.clone(), name: p.name.clone() });

    heroes.chain(war_heroes).chain(places).collect()
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Record counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub heroes: usize,
    pub war_heroes: usize,
    pub places: usize,
    pub quiz: usize,
    pub events: usize,
}

impl Stats {
    #[must_use]
    pub fn of(collections: &Collections) -> Self {
        Self {
            heroes: collections.heroes.len(),
            war_heroes: collections.war_heroes.len(),
            places: collections.places.len(),
            quiz: collections.quiz.len(),
            events: collections.events.len(),
        }
    }
}

/// Pretty JSON backup of every collection.
///
/// # Errors
///
/// Returns an error if a record cannot be encoded.
pub fn backup_json(collections: &Collections) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(collections)
}

/// `history-backup-YYYY-MM-DD.json` for the given moment (UTC date).
#[must_use]
pub fn backup_file_name(at: OffsetDateTime) -> String {
    let date = at.to_offset(UtcOffset::UTC).date();
    format!("history-backup-{:04}-{:02}-{:02}.json", date.year(), u8::from(date.month()), date.day())
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;
