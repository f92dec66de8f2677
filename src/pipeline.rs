//! Pipeline orchestration for one merge run.
//!
//! Fixed order: for each source of the inventory, parse its configuration
//! and track payload and ingest them under that source's prefix; resolve the
//! class/ship filters into a name allow-list; prune the store once with the
//! selection policy; project the survivors into the GPX and qtVlm outputs.
//! The store is owned here and handed to each stage by reference, never
//! retained by a stage beyond its call.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, LegMarks, RaceConfig};
use crate::export::{self, ExportError};
use crate::feed::{FeedError, TrackFeed};
use crate::ingest::{IngestError, SourceIngestor, SourcePrefix};
use crate::inventory::{InventoryError, SourceInventory};
use crate::selection::{
    apply_removals, compute_removals, RemovalReason, SelectionCriteria,
};
use crate::track::TrackStore;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("source '{source}': {error}")]
    SourceConfig {
        source: String,
        #[source]
        error: ConfigError,
    },

    #[error("source '{source}': {error}")]
    SourceFeed {
        source: String,
        #[source]
        error: FeedError,
    },

    #[error("{0}")]
    Ingest(#[from] IngestError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Inventory(_) => 2,
            PipelineError::SourceConfig { .. } => 3,
            PipelineError::SourceFeed { .. } => 4,
            PipelineError::Ingest(_) => 5,
            PipelineError::Export(_) => 6,
            PipelineError::Io(_) => 1,
            PipelineError::Serialization(_) => 1,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Caller-facing options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Only include boats of this race class.
    pub class_filter: Option<String>,

    /// Restrict output to boats with this name.
    pub name_filter: Option<String>,

    /// Drop boats more than an hour behind the fleet's last report.
    pub exclude_dnf: bool,

    /// Add display-color extensions to the GPX tracks.
    pub color_tracks: bool,

    /// Directory receiving the output files.
    pub out_dir: PathBuf,

    /// Detail lines on stderr.
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            class_filter: None,
            name_filter: None,
            exclude_dnf: false,
            color_tracks: false,
            out_dir: PathBuf::from("."),
            verbose: false,
        }
    }
}

/// What one source contributed, for the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub prefix: char,
    pub boats_registered: usize,
    pub chunks_ingested: usize,
    pub samples_appended: usize,
    pub chunk_errors: usize,
}

/// Run summary, printable as JSON for downstream tooling.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the summary was created
    pub created_at: DateTime<Utc>,

    /// Per-source merge statistics, in merge order
    pub sources: Vec<SourceSummary>,

    /// Boats registered across all sources
    pub boats_registered: usize,

    /// Samples appended across all sources
    pub samples_appended: usize,

    /// Chunks skipped because they named an unregistered boat
    pub chunk_errors: usize,

    /// Latest position timestamp over the merged fleet
    pub last_report: Option<DateTime<Utc>>,

    /// Boats removed by the selection policy
    pub boats_removed: usize,

    /// Removals attributed to the allow-list rule
    pub removed_by_filter: usize,

    /// Removals attributed to the no-track rule
    pub removed_no_track: usize,

    /// Removals attributed to the DNF rule
    pub removed_dnf: usize,

    /// Boats retained in the output
    pub boats_retained: usize,

    /// Selection removed every boat; outputs are empty but valid
    pub empty_selection: bool,

    /// Files written
    pub outputs: Vec<PathBuf>,
}

impl RunSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn human_summary(&self) -> String {
        format!(
            "Merged {} source(s): {} boat(s) registered, {} retained, {} removed ({} sample(s), {} chunk error(s))",
            self.sources.len(),
            self.boats_registered,
            self.boats_retained,
            self.boats_removed,
            self.samples_appended,
            self.chunk_errors,
        )
    }
}

/// Executes one merge run end to end.
pub fn run(inventory: &SourceInventory, options: &RunOptions) -> PipelineResult<RunSummary> {
    inventory.validate()?;

    let mut store = TrackStore::new();
    let mut allow_names: BTreeSet<String> = BTreeSet::new();
    let mut marks: Option<LegMarks> = None;
    let mut source_summaries = Vec::with_capacity(inventory.sources.len());

    for (index, entry) in inventory.sources.iter().enumerate() {
        let prefix = SourcePrefix::for_index(index)?;
        eprintln!("Merging source '{}' (prefix '{}')...", entry.name, prefix);

        let config =
            RaceConfig::from_file(&entry.config).map_err(|error| PipelineError::SourceConfig {
                source: entry.name.clone(),
                error,
            })?;
        let feed =
            TrackFeed::from_file(&entry.tracks).map_err(|error| PipelineError::SourceFeed {
                source: entry.name.clone(),
                error,
            })?;

        if let Some(class) = &options.class_filter {
            let names = config.boat_names_in_class(class);
            if options.verbose && !names.is_empty() {
                eprintln!("  class '{}' contributes {} boat(s)", class, names.len());
            }
            allow_names.extend(names);
        }

        let ingestor = SourceIngestor::new(prefix);
        let report = ingestor.ingest(&config, &feed, &mut store);
        for chunk_error in &report.chunk_errors {
            eprintln!("Warning: source '{}': {}", entry.name, chunk_error);
        }
        if options.verbose {
            eprintln!(
                "  {} boat(s), {} sample(s) in {} chunk(s)",
                report.boats_registered, report.samples_appended, report.chunks_ingested
            );
        }

        // Later sources overwrite the marks; one merged race replays against
        // a single start/finish pair.
        marks = Some(
            config
                .leg_marks()
                .map_err(|error| PipelineError::SourceConfig {
                    source: entry.name.clone(),
                    error,
                })?,
        );

        source_summaries.push(SourceSummary {
            name: entry.name.clone(),
            prefix: prefix.symbol(),
            boats_registered: report.boats_registered,
            chunks_ingested: report.chunks_ingested,
            samples_appended: report.samples_appended,
            chunk_errors: report.chunk_errors.len(),
        });
    }

    let marks = marks.ok_or(PipelineError::Inventory(InventoryError::NoSources))?;

    if let Some(name) = &options.name_filter {
        allow_names.insert(name.clone());
    }

    let criteria = SelectionCriteria {
        allow_names,
        exclude_dnf: options.exclude_dnf,
    };
    let plan = compute_removals(&store, &criteria);

    if let Some(last) = plan.last_time {
        let last_utc = DateTime::from_timestamp(last as i64, 0).unwrap_or_default();
        eprintln!("Tracks finish at {}", last_utc.format("%Y-%m-%d %H:%M:%S"));
    }
    for removal in &plan.removals {
        match removal.reason {
            RemovalReason::NoTrack => {
                eprintln!("Excluding {} since it has no track", removal.name);
            }
            RemovalReason::Dnf => {
                eprintln!("Excluding {} as DNF", removal.name);
            }
            RemovalReason::NotInAllowList => {
                if options.verbose {
                    eprintln!("Excluding {} (outside filter)", removal.name);
                }
            }
        }
    }

    let removed_by_filter = plan.count_for(RemovalReason::NotInAllowList);
    let removed_no_track = plan.count_for(RemovalReason::NoTrack);
    let removed_dnf = plan.count_for(RemovalReason::Dnf);
    let boats_removed = apply_removals(&mut store, &plan);
    eprintln!("Removed {} boat(s)", boats_removed);

    let empty_selection = store.is_empty();
    if empty_selection {
        eprintln!("Warning: selection removed every boat; outputs will be empty");
    }

    fs::create_dir_all(&options.out_dir)?;
    let tracks_path = options.out_dir.join("tracks.gpx");
    export::write_tracks_gpx(&store, options.color_tracks, &tracks_path)?;
    eprintln!("Created {}", tracks_path.display());

    let wpts_path = options.out_dir.join("wpts.gpx");
    export::write_waypoints_gpx(&store, &marks, &wpts_path)?;
    eprintln!("Created {}", wpts_path.display());

    let routes_path = options.out_dir.join("qtvlm_all_routes.xml");
    export::write_qtvlm_routes(&store, &routes_path)?;
    eprintln!("Created {}", routes_path.display());

    let boats_registered = source_summaries.iter().map(|s| s.boats_registered).sum();
    let samples_appended = source_summaries.iter().map(|s| s.samples_appended).sum();
    let chunk_errors = source_summaries.iter().map(|s| s.chunk_errors).sum();

    Ok(RunSummary {
        created_at: Utc::now(),
        sources: source_summaries,
        boats_registered,
        samples_appended,
        chunk_errors,
        last_report: plan
            .last_time
            .and_then(|t| DateTime::from_timestamp(t as i64, 0)),
        boats_removed,
        removed_by_filter,
        removed_no_track,
        removed_dnf,
        boats_retained: store.len(),
        empty_selection,
        outputs: vec![tracks_path, wpts_path, routes_path],
    })
}
