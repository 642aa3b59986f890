//! Export projection of a project.
//!
//! [`build_export`] joins the project records into the shape document
//! renderers consume. Rendering itself happens elsewhere.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use masterkey_core::{get_standard, HierarchyId, KaGroupId, StandardId};
use masterkey_store::{
    Door, HierarchyLevel, KaGroup, KeyType, Keying, ProjectConfig, ProjectData, Zone,
};
use serde::{Deserialize, Serialize};

use crate::capacity::{assignment_stats, compute_capacity, AssignmentStats, CapacityReport};

/// Identity and parameters of the active standard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardSummary {
    /// Standard identifier.
    pub id: StandardId,
    /// Display name.
    pub name: String,
    /// Published version.
    pub version: String,
    /// Region.
    pub region: String,
    /// Pin stacks.
    pub pins: u32,
    /// Depths per pin.
    pub depths: u64,
    /// Maximum adjacent cut specification.
    pub macs: u32,
    /// Differs ceiling.
    pub max_differs: u64,
}

impl From<StandardId> for StandardSummary {
    fn from(id: StandardId) -> Self {
        let standard = get_standard(id);
        Self {
            id,
            name: standard.name.to_string(),
            version: standard.version.to_string(),
            region: standard.region.to_string(),
            pins: standard.pin_config.pins,
            depths: standard.pin_config.depths,
            macs: standard.pin_config.macs,
            max_differs: standard.max_differs,
        }
    }
}

/// One row of the keying schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Door identifier.
    pub door_id: String,
    /// Door mark.
    pub mark: Option<String>,
    /// Door use.
    #[serde(rename = "use")]
    pub door_use: Option<String>,
    /// Zone.
    pub zone: Option<String>,
    /// Floor level.
    pub floor: Option<String>,
    /// Change-key symbol; `None` if unassigned.
    pub key_symbol: Option<String>,
    /// Symbol of the level the door is keyed under.
    pub level_symbol: Option<String>,
    /// Name of that level.
    pub level_name: Option<String>,
    /// KD or KA.
    pub key_type: Option<KeyType>,
    /// Keyed-alike group name.
    pub ka_group_name: Option<String>,
    /// Physical keys cut for the door; 0 for keyed-alike members.
    pub key_quantity: Option<u32>,
    /// Cylinders to install.
    pub cylinders: u32,
    /// Fire rating.
    pub fire_rating: Option<String>,
    /// Accessible route.
    pub ada: bool,
}

/// Where a cut key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// A hierarchy level.
    Hierarchy,
    /// A keyed-differ door.
    KeyedDiffer,
    /// A keyed-alike group.
    KeyedAlike,
}

/// One distinct symbol to cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuttingListEntry {
    /// Key symbol.
    pub symbol: String,
    /// Level, door or group name.
    pub name: String,
    /// Physical keys to cut.
    pub quantity: u32,
    /// Record the key belongs to.
    pub source: KeySource,
}

/// Everything an export renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Active standard.
    pub standard: StandardSummary,
    /// Project configuration.
    pub config: ProjectConfig,
    /// Hierarchy levels ordered by tier.
    pub hierarchy: Vec<HierarchyLevel>,
    /// Zones in stored order.
    pub zones: Vec<Zone>,
    /// One row per door in schedule order.
    pub schedule: Vec<ScheduleRow>,
    /// Distinct symbols with their quantities.
    pub cutting_list: Vec<CuttingListEntry>,
    /// Capacity figures.
    pub capacity: CapacityReport,
    /// Assignment progress.
    pub stats: AssignmentStats,
}

impl ExportSnapshot {
    /// Physical keys on the cutting list.
    #[must_use]
    pub fn total_keys(&self) -> u64 {
        self.cutting_list
            .iter()
            .map(|e| u64::from(e.quantity))
            .sum()
    }
}

fn schedule_row(
    door: &Door,
    data: &ProjectData,
    levels: &HashMap<HierarchyId, &HierarchyLevel>,
) -> ScheduleRow {
    let assignment = data.assignments.iter().find(|a| a.door_id == door.id);
    let level = assignment.and_then(|a| levels.get(&a.hierarchy_id));

    ScheduleRow {
        door_id: door.id.to_string(),
        mark: door.mark.clone(),
        door_use: door.door_use.clone(),
        zone: door.zone.clone(),
        floor: door.level.clone(),
        key_symbol: assignment.map(|a| a.key_symbol.clone()),
        level_symbol: level.map(|l| l.key_symbol.clone()),
        level_name: level.map(|l| l.name.clone()),
        key_type: assignment.map(masterkey_store::Assignment::key_type),
        ka_group_name: assignment.and_then(|a| match &a.keying {
            Keying::KeyedAlike { ka_group_name, .. } => Some(ka_group_name.clone()),
            Keying::KeyedDiffer { .. } => None,
        }),
        key_quantity: assignment.map(masterkey_store::Assignment::key_quantity),
        cylinders: door.cylinders(),
        fire_rating: door.fire_rating.clone(),
        ada: door.ada,
    }
}

fn cutting_list(data: &ProjectData, hierarchy: &[HierarchyLevel]) -> Vec<CuttingListEntry> {
    let groups: HashMap<KaGroupId, &KaGroup> = data.ka_groups.iter().map(|g| (g.id, g)).collect();
    let doors: HashMap<_, &Door> = data.doors.iter().map(|d| (&d.id, d)).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();

    for level in hierarchy {
        if seen.insert(level.key_symbol.clone()) {
            entries.push(CuttingListEntry {
                symbol: level.key_symbol.clone(),
                name: level.name.clone(),
                quantity: level.effective_key_quantity(),
                source: KeySource::Hierarchy,
            });
        }
    }

    for assignment in &data.assignments {
        if !seen.insert(assignment.key_symbol.clone()) {
            continue;
        }
        let entry = match &assignment.keying {
            Keying::KeyedDiffer { .. } => CuttingListEntry {
                symbol: assignment.key_symbol.clone(),
                name: doors
                    .get(&assignment.door_id)
                    .and_then(|d| d.mark.clone())
                    .unwrap_or_else(|| assignment.door_id.to_string()),
                quantity: assignment.key_quantity(),
                source: KeySource::KeyedDiffer,
            },
            Keying::KeyedAlike {
                ka_group_id,
                ka_group_name,
            } => CuttingListEntry {
                symbol: assignment.key_symbol.clone(),
                name: ka_group_name.clone(),
                quantity: groups.get(ka_group_id).map_or(0, |g| g.key_quantity),
                source: KeySource::KeyedAlike,
            },
        };
        entries.push(entry);
    }

    entries
}

/// Project the records into an export snapshot.
#[must_use]
pub fn build_export(data: &ProjectData, generated_at: DateTime<Utc>) -> ExportSnapshot {
    let standard = get_standard(data.config.standard);

    let mut hierarchy = data.hierarchies.clone();
    hierarchy.sort_by_key(|h| h.order);
    let levels: HashMap<HierarchyId, &HierarchyLevel> =
        data.hierarchies.iter().map(|h| (h.id, h)).collect();

    let schedule = data
        .doors
        .iter()
        .map(|door| schedule_row(door, data, &levels))
        .collect();
    let cutting_list = cutting_list(data, &hierarchy);

    let capacity = compute_capacity(
        standard,
        &data.doors,
        &data.hierarchies,
        &data.assignments,
        &data.ka_groups,
    );

    ExportSnapshot {
        generated_at,
        standard: StandardSummary::from(data.config.standard),
        config: data.config,
        zones: data.zones.clone(),
        schedule,
        cutting_list,
        capacity: CapacityReport::from(capacity),
        stats: assignment_stats(&data.doors, &data.hierarchies, &data.assignments),
        hierarchy,
    }
}
