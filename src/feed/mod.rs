//! Track chunk payload.
//!
//! The second document a source delivers: a JSON list of chunks, each naming
//! a raw boat id and carrying an ordered batch of timestamped samples.
//! Tracker backends batch updates, so the same boat routinely appears in
//! several chunks; sample order within and across chunks is preserved as
//! delivered.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Errors raised while loading a track payload.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read track payload: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed track payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one source delivered in one fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackFeed {
    #[serde(default)]
    pub tracks: Vec<TrackChunk>,
}

/// A batch of samples for one boat, delivered together.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackChunk {
    /// Raw per-source boat id; only unique within the source.
    pub id: String,

    /// Samples in delivery order, non-decreasing timestamps for a
    /// well-formed feed.
    #[serde(default)]
    pub locations: Vec<Sample>,
}

/// One raw `(timestamp, lat, lon)` triple.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    pub lat: f64,
    pub lon: f64,
}

impl TrackFeed {
    pub fn from_str(json: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, FeedError> {
        let json = fs::read_to_string(path)?;
        Self::from_str(&json)
    }

    /// Total samples across all chunks.
    pub fn sample_count(&self) -> usize {
        self.tracks.iter().map(|c| c.locations.len()).sum()
    }
}
