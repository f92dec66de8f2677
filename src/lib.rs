//! sailtrack - merged boat tracks from sailing-race tracker telemetry
//!
//! This crate merges boat-position chunks from one or more tracker sources
//! into a unified per-boat track model, filters it by race class, boat name
//! and finish status, and renders GPX track/waypoint files plus a qtVlm
//! multi-routing job descriptor.

pub mod config;
pub mod export;
pub mod feed;
pub mod ingest;
pub mod inventory;
pub mod pipeline;
pub mod selection;
pub mod track;

pub use ingest::{IngestReport, SourceIngestor, SourcePrefix};
pub use selection::{apply_removals, compute_removals, SelectionCriteria, SelectionPlan};
pub use track::{Boat, Position, TrackStore};
