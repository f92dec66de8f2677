//! Per-boat track model and the merging store.
//!
//! `TrackStore` is the single shared aggregate of a run: every source's
//! ingestion pass appends into it, the selection pass prunes it once, and
//! output projection reads it afterwards. Position sequences are append-only
//! during ingestion and are never re-sorted or deduplicated; a malformed feed
//! stays visible in the output instead of being silently masked.

use std::collections::BTreeMap;

/// One timestamped geolocation sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: f64,
    /// Degrees, nominally -90..90. Raw feeds are not validated here.
    pub latitude: f64,
    /// Degrees, nominally -180..180.
    pub longitude: f64,
}

impl Position {
    pub fn new(timestamp: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
        }
    }
}

/// A boat with its merged track.
///
/// The id is globally unique once the source prefix has been applied; the
/// display name comes from the source and is not guaranteed unique.
#[derive(Debug, Clone)]
pub struct Boat {
    id: String,
    name: String,
    positions: Vec<Position>,
}

impl Boat {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            positions: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positions in merge order (chunk-delivery order within the source).
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Most recently appended position. The sequence is never re-ordered,
    /// so this is also the boat's latest report for a well-formed feed.
    pub fn last_position(&self) -> Option<&Position> {
        self.positions.last()
    }

    /// Appends a sample. No ordering check is performed here; chronology
    /// within a source is the ingestor's contract.
    pub fn append_position(&mut self, position: Position) {
        self.positions.push(position);
    }
}

/// Mapping from globally-unique boat id to boat.
///
/// Backed by a `BTreeMap` so that iteration for output is deterministic
/// (sorted by id, which groups boats by source prefix).
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    boats: BTreeMap<String, Boat>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.boats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boats.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.boats.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Boat> {
        self.boats.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Boat> {
        self.boats.get_mut(id)
    }

    /// Registers a boat under `id` if absent. Returns `true` when the boat
    /// was newly created. Re-registration keeps the existing entry untouched,
    /// in particular it never resets an already-merged position sequence.
    pub fn register(&mut self, id: impl Into<String>, name: impl Into<String>) -> bool {
        let id = id.into();
        if self.boats.contains_key(&id) {
            return false;
        }
        let boat = Boat::new(id.clone(), name);
        self.boats.insert(id, boat);
        true
    }

    /// Boats in id order.
    pub fn boats(&self) -> impl Iterator<Item = &Boat> {
        self.boats.values()
    }

    /// Boat ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.boats.keys().map(String::as_str)
    }

    pub fn remove(&mut self, id: &str) -> Option<Boat> {
        self.boats.remove(id)
    }
}
