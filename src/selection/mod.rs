//! Boat selection policy.
//!
//! Decides which boats are dropped from the merged store before output:
//! boats whose name is outside the allow-list, boats with no track at all,
//! and (opt-in) boats that trail the fleet's latest report by more than the
//! DNF threshold.
//!
//! The policy is two-phase. `compute_removals` is a pure function over the
//! unmodified store: it collects every mark and derives the fleet's
//! `last_time` from the full candidate set, so the DNF cutoff can never be
//! affected by boats removed earlier in the same pass. `apply_removals` then
//! deletes the marked boats in a single batch.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::track::TrackStore;

/// A boat is DNF when its latest report trails the fleet's by more than this.
pub const DNF_THRESHOLD_SECONDS: f64 = 3600.0;

/// Which rule marked a boat for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Name not in the allow-list derived from the class/name filters.
    NotInAllowList,
    /// Empty position sequence.
    NoTrack,
    /// Latest report more than the threshold behind the fleet.
    Dnf,
}

/// Criteria accepted from the caller. Class and ship-name filters have
/// already been resolved to boat names by the time they reach this module.
#[derive(Debug, Clone, Default)]
pub struct SelectionCriteria {
    /// Boat names to keep; empty means no name filtering.
    pub allow_names: BTreeSet<String>,

    /// Apply the DNF rule.
    pub exclude_dnf: bool,
}

/// One boat marked for removal.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub id: String,
    pub name: String,
    pub reason: RemovalReason,
}

/// Outcome of the marking phase.
#[derive(Debug, Clone, Default)]
pub struct SelectionPlan {
    /// Marked boats, sorted by id. A boat matched by several rules appears
    /// once, under the first rule that marked it.
    pub removals: Vec<Removal>,

    /// Latest position timestamp over boats that have any track, including
    /// boats marked by other rules. Empty-track boats have no timestamp to
    /// contribute.
    pub last_time: Option<f64>,
}

impl SelectionPlan {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty()
    }

    pub fn removal_ids(&self) -> BTreeSet<&str> {
        self.removals.iter().map(|r| r.id.as_str()).collect()
    }

    /// Count of marks attributed to `reason`.
    pub fn count_for(&self, reason: RemovalReason) -> usize {
        self.removals.iter().filter(|r| r.reason == reason).count()
    }
}

/// Marks boats for removal without touching the store.
pub fn compute_removals(store: &TrackStore, criteria: &SelectionCriteria) -> SelectionPlan {
    let mut marked: BTreeMap<String, Removal> = BTreeMap::new();
    let mut mark = |id: &str, name: &str, reason: RemovalReason| {
        marked.entry(id.to_string()).or_insert_with(|| Removal {
            id: id.to_string(),
            name: name.to_string(),
            reason,
        });
    };

    let filter_by_name = !criteria.allow_names.is_empty();
    let mut last_time: Option<f64> = None;

    for boat in store.boats() {
        if filter_by_name && !criteria.allow_names.contains(boat.name()) {
            mark(boat.id(), boat.name(), RemovalReason::NotInAllowList);
        }
        match boat.last_position() {
            None => mark(boat.id(), boat.name(), RemovalReason::NoTrack),
            Some(position) => {
                last_time = Some(match last_time {
                    Some(t) => t.max(position.timestamp),
                    None => position.timestamp,
                });
            }
        }
    }

    if criteria.exclude_dnf {
        if let Some(last) = last_time {
            for boat in store.boats() {
                if let Some(position) = boat.last_position() {
                    if last - position.timestamp > DNF_THRESHOLD_SECONDS {
                        mark(boat.id(), boat.name(), RemovalReason::Dnf);
                    }
                }
            }
        }
    }

    SelectionPlan {
        removals: marked.into_values().collect(),
        last_time,
    }
}

/// Applies a plan as one batch. Returns the number of boats removed.
/// Whole boats only; a retained boat's sequence is never trimmed.
pub fn apply_removals(store: &mut TrackStore, plan: &SelectionPlan) -> usize {
    let mut removed = 0;
    for removal in &plan.removals {
        if store.remove(&removal.id).is_some() {
            removed += 1;
        }
    }
    removed
}
