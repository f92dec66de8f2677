//! Race configuration document.
//!
//! One tracker source publishes an XML configuration describing its boat
//! classes, the boats in each class, and the race legs. The leg's `num`
//! attribute is a 1-based index into `runs/run`; the selected run's `start`
//! and `arrival` supply the race marks used for output annotation.
//!
//! Structural problems are fatal: a config that cannot be parsed in full
//! aborts the run, there is no degraded mode.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Errors raised while loading or interpreting a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config document: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("config document declares no boat classes")]
    NoBoatClasses,

    #[error("leg {num} selects a run out of range (document has {available} run(s))")]
    LegOutOfRange { num: usize, available: usize },
}

/// Parsed configuration document for one source.
#[derive(Debug, Clone, Deserialize)]
pub struct RaceConfig {
    boats: BoatsSection,
    leg: Leg,
}

#[derive(Debug, Clone, Deserialize)]
struct BoatsSection {
    #[serde(default, rename = "boatclass")]
    classes: Vec<BoatClass>,
}

/// One race class and the boats sailing in it.
#[derive(Debug, Clone, Deserialize)]
pub struct BoatClass {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(default, rename = "boat")]
    pub boats: Vec<BoatEntry>,
}

/// One boat as declared by the source. The id is only unique within the
/// source; global uniqueness comes from the ingestor's prefix.
#[derive(Debug, Clone, Deserialize)]
pub struct BoatEntry {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Leg {
    #[serde(rename = "@num")]
    num: usize,

    runs: Runs,
}

#[derive(Debug, Clone, Deserialize)]
struct Runs {
    #[serde(default, rename = "run")]
    runs: Vec<RunEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct RunEntry {
    start: Mark,
    arrival: Mark,
}

/// A lat/lon mark without a timestamp.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Mark {
    #[serde(rename = "@lat")]
    pub lat: f64,

    #[serde(rename = "@lng")]
    pub lng: f64,
}

/// Start and finish marks of the selected leg run.
#[derive(Debug, Clone, Copy)]
pub struct LegMarks {
    pub start: Mark,
    pub finish: Mark,
}

impl RaceConfig {
    /// Parses and validates a configuration document.
    pub fn from_str(xml: &str) -> Result<Self, ConfigError> {
        let config: RaceConfig = quick_xml::de::from_str(xml)?;
        if config.boats.classes.is_empty() {
            return Err(ConfigError::NoBoatClasses);
        }
        // Resolve the leg selection up front so a bad leg number fails the
        // run before any ingestion happens.
        config.leg_marks()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let xml = fs::read_to_string(path)?;
        Self::from_str(&xml)
    }

    pub fn classes(&self) -> &[BoatClass] {
        &self.boats.classes
    }

    /// Every boat declared by the source, across all classes.
    pub fn all_boats(&self) -> impl Iterator<Item = &BoatEntry> {
        self.boats.classes.iter().flat_map(|c| c.boats.iter())
    }

    /// Names of the boats sailing in `class`. Empty when the source does not
    /// know the class; a class filter then simply contributes nothing from
    /// this source.
    pub fn boat_names_in_class(&self, class: &str) -> Vec<String> {
        self.boats
            .classes
            .iter()
            .filter(|c| c.name == class)
            .flat_map(|c| c.boats.iter().map(|b| b.name.clone()))
            .collect()
    }

    /// Start and finish marks of the run selected by the leg number.
    pub fn leg_marks(&self) -> Result<LegMarks, ConfigError> {
        let runs = &self.leg.runs.runs;
        let run = self
            .leg
            .num
            .checked_sub(1)
            .and_then(|index| runs.get(index))
            .ok_or(ConfigError::LegOutOfRange {
                num: self.leg.num,
                available: runs.len(),
            })?;
        Ok(LegMarks {
            start: run.start,
            finish: run.arrival,
        })
    }
}
