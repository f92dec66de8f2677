//! Per-source ingestion into the shared track store.
//!
//! Raw boat ids are only unique within one source, so every source is given
//! a one-letter prefix by the caller, derived from its position in the merge
//! order. The prefix is an explicit parameter rather than hidden iteration
//! state: callers that enumerate sources in a stable order get stable ids.

use std::fmt;

use crate::config::RaceConfig;
use crate::feed::TrackFeed;
use crate::track::{Position, TrackStore};

/// Prefix symbols in source-registration order.
const PREFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors raised while setting up ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("source index {index} exceeds the {max} supported sources")]
    TooManySources { index: usize, max: usize },
}

/// Identity prefix for one source, assigned by registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePrefix(char);

impl SourcePrefix {
    /// Prefix for the `index`-th source of a run (0-based).
    pub fn for_index(index: usize) -> Result<Self, IngestError> {
        PREFIX_ALPHABET
            .get(index)
            .map(|&b| SourcePrefix(b as char))
            .ok_or(IngestError::TooManySources {
                index,
                max: PREFIX_ALPHABET.len(),
            })
    }

    pub fn symbol(&self) -> char {
        self.0
    }

    /// Globally-unique id for a raw per-source boat id.
    pub fn apply(&self, raw_id: &str) -> String {
        format!("{}{}", self.0, raw_id)
    }
}

impl fmt::Display for SourcePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chunk that referenced a raw id the source never registered.
///
/// Indicates the configuration and track payload are out of sync for that
/// source. The chunk is skipped, the rest of the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReference {
    pub raw_id: String,
    pub samples_skipped: usize,
}

impl fmt::Display for ChunkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk references unregistered boat id '{}' ({} sample(s) skipped)",
            self.raw_id, self.samples_skipped
        )
    }
}

/// What one source contributed to the store.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Boats newly registered from the configuration document.
    pub boats_registered: usize,

    /// Chunks whose samples were appended.
    pub chunks_ingested: usize,

    /// Samples appended across all chunks.
    pub samples_appended: usize,

    /// Chunks naming an unregistered boat; skipped, not fatal.
    pub chunk_errors: Vec<ChunkReference>,
}

/// Feeds one source's configuration and chunks into a shared store.
pub struct SourceIngestor {
    prefix: SourcePrefix,
}

impl SourceIngestor {
    pub fn new(prefix: SourcePrefix) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> SourcePrefix {
        self.prefix
    }

    /// Registers every boat of the configuration under its prefixed id.
    /// Returns the number of boats newly created; re-registration leaves
    /// existing entries (and their positions) untouched.
    pub fn register_boats(&self, config: &RaceConfig, store: &mut TrackStore) -> usize {
        let mut registered = 0;
        for boat in config.all_boats() {
            if store.register(self.prefix.apply(&boat.id), boat.name.clone()) {
                registered += 1;
            }
        }
        registered
    }

    /// Appends every chunk sample, in delivery order, to its boat.
    /// Chunks naming unknown raw ids are recorded on the report and skipped.
    pub fn ingest_chunks(&self, feed: &TrackFeed, store: &mut TrackStore, report: &mut IngestReport) {
        for chunk in &feed.tracks {
            let id = self.prefix.apply(&chunk.id);
            let Some(boat) = store.get_mut(&id) else {
                report.chunk_errors.push(ChunkReference {
                    raw_id: chunk.id.clone(),
                    samples_skipped: chunk.locations.len(),
                });
                continue;
            };
            for sample in &chunk.locations {
                boat.append_position(Position::new(sample.timestamp, sample.lat, sample.lon));
            }
            report.chunks_ingested += 1;
            report.samples_appended += chunk.locations.len();
        }
    }

    /// Full ingestion pass for one source: registration, then chunks.
    pub fn ingest(
        &self,
        config: &RaceConfig,
        feed: &TrackFeed,
        store: &mut TrackStore,
    ) -> IngestReport {
        let mut report = IngestReport {
            boats_registered: self.register_boats(config, store),
            ..IngestReport::default()
        };
        self.ingest_chunks(feed, store, &mut report);
        report
    }
}
