//! Engine configuration and request types.

use masterkey_core::{FacilityType, KeyingApproach, StandardId};
use masterkey_store::{Assignment, Door, HierarchyLevel, KaGroup, ProjectData};
use serde::{Deserialize, Serialize};

/// Borrowed view of the records planning and validation work on.
#[derive(Debug, Clone, Copy)]
pub struct DesignSnapshot<'a> {
    /// Door schedule.
    pub doors: &'a [Door],
    /// Hierarchy levels in stored order.
    pub hierarchies: &'a [HierarchyLevel],
    /// Live assignments.
    pub assignments: &'a [Assignment],
    /// Keyed-alike groups.
    pub ka_groups: &'a [KaGroup],
}

impl<'a> From<&'a ProjectData> for DesignSnapshot<'a> {
    fn from(data: &'a ProjectData) -> Self {
        Self {
            doors: &data.doors,
            hierarchies: &data.hierarchies,
            assignments: &data.assignments,
            ka_groups: &data.ka_groups,
        }
    }
}

/// Tunables shared by the planners and the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Physical keys cut per keyed-differ door when none is given.
    pub default_kd_key_quantity: u32,
    /// Physical keys cut per keyed-alike group when none is given.
    pub default_ka_key_quantity: u32,
    /// Physical keys cut per hierarchy level when none is given.
    pub default_level_key_quantity: u32,
    /// Door-count approach: doors grouped under one master.
    pub doors_per_master: usize,
    /// Upper bound of the master-count estimate.
    pub max_masters: u32,
    /// Lower bound of the master-count estimate.
    pub min_masters: u32,
    /// Master count used when there are no doors yet.
    pub masters_without_doors: u32,
    /// Functional approach: most distinct uses that get a master.
    pub max_functional_groups: usize,
    /// Change keys per master assumed by the preview when there are no doors.
    pub preview_change_keys_per_master: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_kd_key_quantity: 2,
            default_ka_key_quantity: 5,
            default_level_key_quantity: 2,
            doors_per_master: 30,
            max_masters: 10,
            min_masters: 2,
            masters_without_doors: 3,
            max_functional_groups: 6,
            preview_change_keys_per_master: 30,
        }
    }
}

/// Parameters of a hierarchy generation or preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRequest {
    /// Standard whose grammar names the keys.
    pub standard: StandardId,
    /// Number of tiers including change keys, 1 to 4.
    pub depth: u32,
    /// How doors are grouped under masters.
    pub approach: KeyingApproach,
    /// Facility the system is designed for.
    pub facility_type: FacilityType,
}

impl HierarchyRequest {
    /// Create a request.
    #[must_use]
    pub const fn new(
        standard: StandardId,
        depth: u32,
        approach: KeyingApproach,
        facility_type: FacilityType,
    ) -> Self {
        Self {
            standard,
            depth,
            approach,
            facility_type,
        }
    }
}

/// A request to create a keyed-alike group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateKaGroupRequest {
    /// Group name.
    pub name: String,
    /// Member doors; duplicates are ignored.
    pub door_ids: Vec<masterkey_core::DoorId>,
    /// Master the group lives under.
    pub master_id: masterkey_core::HierarchyId,
    /// Physical keys for the whole group. Uses the configured default if not provided.
    #[serde(default)]
    pub key_quantity: Option<u32>,
}

/// Fields of a keyed-alike group that can be changed in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KaGroupUpdate {
    /// New group name.
    #[serde(default)]
    pub name: Option<String>,
    /// New physical-key quantity.
    #[serde(default)]
    pub key_quantity: Option<u32>,
}

/// Fields of a hierarchy level that can be changed in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevelUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New physical-key quantity.
    #[serde(default)]
    pub key_quantity: Option<u32>,
}

/// A manually specified hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHierarchyLevel {
    /// Human name.
    pub name: String,
    /// Level code, e.g. `MK`.
    pub level_type: String,
    /// Key symbol.
    pub key_symbol: String,
    /// Depth in the tree, 0 = top.
    pub order: u32,
    /// Parent level; required unless `order` is 0.
    #[serde(default)]
    pub parent_id: Option<masterkey_core::HierarchyId>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Physical keys to cut.
    #[serde(default)]
    pub key_quantity: Option<u32>,
}
