//! Source inventory.
//!
//! Parses the `sources.toml` manifest listing the tracker sources of a run.
//! Manifest order is merge order: the Nth source gets the Nth identity
//! prefix, so reordering the manifest changes the ids in the output.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Source inventory manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventory {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Sources in merge order
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

fn default_schema_version() -> u32 {
    1
}

/// One tracker source contributing boats and chunks to a merged run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Unique name, used for reporting only; identity comes from order
    pub name: String,

    /// Path to the race configuration XML
    pub config: PathBuf,

    /// Path to the track chunk JSON payload
    pub tracks: PathBuf,
}

/// Errors that can occur when loading or validating the source inventory
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Failed to read inventory file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate source name: '{0}'")]
    DuplicateName(String),

    #[error("Inventory file not found: {0}")]
    NotFound(PathBuf),

    #[error("No sources configured")]
    NoSources,
}

impl SourceInventory {
    /// Parse from a TOML string and validate.
    pub fn from_toml(content: &str) -> Result<Self, InventoryError> {
        let inventory: SourceInventory = toml::from_str(content)?;
        inventory.validate()?;
        Ok(inventory)
    }

    /// Load from a manifest file. Relative config/tracks paths resolve
    /// against the manifest's directory.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        if !path.exists() {
            return Err(InventoryError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut inventory = Self::from_toml(&content)?;

        if let Some(base) = path.parent() {
            for source in &mut inventory.sources {
                if source.config.is_relative() {
                    source.config = base.join(&source.config);
                }
                if source.tracks.is_relative() {
                    source.tracks = base.join(&source.tracks);
                }
            }
        }
        Ok(inventory)
    }

    /// Build an inventory from bare source directories, each expected to
    /// contain `config.xml` and `tracks.json`.
    pub fn from_dirs(dirs: &[PathBuf]) -> Result<Self, InventoryError> {
        let inventory = SourceInventory {
            schema_version: default_schema_version(),
            sources: dirs
                .iter()
                .map(|dir| SourceEntry {
                    name: dir.display().to_string(),
                    config: dir.join("config.xml"),
                    tracks: dir.join("tracks.json"),
                })
                .collect(),
        };
        inventory.validate()?;
        Ok(inventory)
    }

    /// Validate the inventory: at least one source, names unique.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.sources.is_empty() {
            return Err(InventoryError::NoSources);
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(InventoryError::DuplicateName(source.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_in_order() {
        let inventory = SourceInventory::from_toml(
            r#"
            schema_version = 1

            [[source]]
            name = "vendee"
            config = "vendee/config.xml"
            tracks = "vendee/tracks.json"

            [[source]]
            name = "figaro"
            config = "figaro/config.xml"
            tracks = "figaro/tracks.json"
            "#,
        )
        .unwrap();

        assert_eq!(inventory.schema_version, 1);
        assert_eq!(inventory.sources.len(), 2);
        assert_eq!(inventory.sources[0].name, "vendee");
        assert_eq!(inventory.sources[1].name, "figaro");
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = SourceInventory::from_toml(
            r#"
            [[source]]
            name = "vendee"
            config = "a/config.xml"
            tracks = "a/tracks.json"

            [[source]]
            name = "vendee"
            config = "b/config.xml"
            tracks = "b/tracks.json"
            "#,
        );
        assert!(matches!(result, Err(InventoryError::DuplicateName(name)) if name == "vendee"));
    }

    #[test]
    fn empty_manifest_rejected() {
        assert!(matches!(
            SourceInventory::from_toml("schema_version = 1"),
            Err(InventoryError::NoSources)
        ));
    }

    #[test]
    fn from_dirs_expects_fixed_file_names() {
        let inventory =
            SourceInventory::from_dirs(&[PathBuf::from("races/vendee")]).unwrap();
        assert_eq!(inventory.sources[0].config, PathBuf::from("races/vendee/config.xml"));
        assert_eq!(inventory.sources[0].tracks, PathBuf::from("races/vendee/tracks.json"));
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("sources.toml");
        std::fs::write(
            &manifest,
            r#"
            [[source]]
            name = "vendee"
            config = "vendee/config.xml"
            tracks = "vendee/tracks.json"
            "#,
        )
        .unwrap();

        let inventory = SourceInventory::load(&manifest).unwrap();
        assert_eq!(
            inventory.sources[0].config,
            dir.path().join("vendee/config.xml")
        );
    }

    #[test]
    fn missing_manifest_reported() {
        let result = SourceInventory::load(Path::new("/nonexistent/sources.toml"));
        assert!(matches!(result, Err(InventoryError::NotFound(_))));
    }
}
