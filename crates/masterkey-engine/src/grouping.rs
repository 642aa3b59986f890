//! Door grouping by zone, floor, or function.
//!
//! The same group names drive master naming in the hierarchy generator and
//! group-to-master matching in the assignment planner.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use masterkey_core::{DoorId, KeyingApproach};
use masterkey_store::Door;

use crate::types::EngineConfig;

/// Bucket for doors whose grouping field is missing.
pub const UNASSIGNED_GROUP: &str = "Unassigned";

/// The group a door falls into, or `None` if its grouping field is missing.
///
/// Door-count grouping depends on schedule position, not on the door, and
/// also yields `None` here.
#[must_use]
pub fn group_label(door: &Door, approach: KeyingApproach) -> Option<String> {
    let value = door.grouping_attribute(approach)?;
    Some(match approach {
        KeyingApproach::FloorBased => format!("Floor {value}"),
        _ => value.to_string(),
    })
}

/// Name of the `index`-th door-count chunk, 1-based.
#[must_use]
pub fn chunk_name(index: usize) -> String {
    format!("Group {}", index + 1)
}

/// Group doors by the approach's field.
///
/// Doors with a missing field land in [`UNASSIGNED_GROUP`]. Door-count
/// grouping splits the schedule into chunks of `config.doors_per_master`.
#[must_use]
pub fn derive_groups(
    doors: &[Door],
    approach: KeyingApproach,
    config: &EngineConfig,
) -> BTreeMap<String, Vec<DoorId>> {
    let mut groups: BTreeMap<String, Vec<DoorId>> = BTreeMap::new();

    if approach == KeyingApproach::DoorCount {
        let size = config.doors_per_master.max(1);
        for (index, chunk) in doors.chunks(size).enumerate() {
            groups.insert(
                chunk_name(index),
                chunk.iter().map(|d| d.id.clone()).collect(),
            );
        }
        return groups;
    }

    for door in doors {
        let name = group_label(door, approach).unwrap_or_else(|| UNASSIGNED_GROUP.to_string());
        groups.entry(name).or_default().push(door.id.clone());
    }
    groups
}

/// Sorted group names used to name masters.
///
/// Missing values are left out. The functional approach keeps the first
/// `config.max_functional_groups` distinct uses in schedule order before
/// sorting.
#[must_use]
pub fn group_names(doors: &[Door], approach: KeyingApproach, config: &EngineConfig) -> Vec<String> {
    match approach {
        KeyingApproach::DoorCount => {
            let chunks = doors.len().div_ceil(config.doors_per_master.max(1));
            (0..chunks).map(chunk_name).collect()
        }
        KeyingApproach::Functional => {
            let mut seen = HashSet::new();
            let mut names: Vec<String> = doors
                .iter()
                .filter_map(|d| group_label(d, approach))
                .filter(|name| seen.insert(name.clone()))
                .take(config.max_functional_groups)
                .collect();
            names.sort();
            names
        }
        KeyingApproach::ZoneBased | KeyingApproach::FloorBased => doors
            .iter()
            .filter_map(|d| group_label(d, approach))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}
