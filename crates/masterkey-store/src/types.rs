//! Record types stored for a master-key project.
//!
//! Doors are owned by the door schedule and consumed read-only. Hierarchy
//! levels, zones, assignments, and keyed-alike groups are owned by the
//! project. The capacity snapshot is derived and recomputed after every
//! mutation.

use chrono::{DateTime, Utc};
use masterkey_core::{
    DoorId, FacilityType, HierarchyId, KaGroupId, KeyingApproach, StandardId, ZoneId,
};
use serde::{Deserialize, Serialize};

/// Physical keys cut per hierarchy level or KD door when no quantity is set.
pub const DEFAULT_KEY_QUANTITY: u32 = 2;

/// Per-project keying configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Active keying standard.
    pub standard: StandardId,
    /// Facility type the system is designed for.
    pub facility_type: FacilityType,
    /// Strategy used to group doors under masters.
    #[serde(default)]
    pub approach: KeyingApproach,
}

impl ProjectConfig {
    /// Create a configuration.
    #[must_use]
    pub const fn new(
        standard: StandardId,
        facility_type: FacilityType,
        approach: KeyingApproach,
    ) -> Self {
        Self {
            standard,
            facility_type,
            approach,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::new(
            StandardId::AnsiBhma,
            FacilityType::CommercialOffice,
            KeyingApproach::ZoneBased,
        )
    }
}

/// A door row from the door schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Schedule identifier.
    pub id: DoorId,
    /// Door mark / label, e.g. `101A`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
    /// Use or function of the door, e.g. `Office`.
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub door_use: Option<String>,
    /// Zone the door belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Floor level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Number of physical leaves this row represents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<u32>,
    /// Door material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Fire rating label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_rating: Option<String>,
    /// Whether the door is on an accessible route.
    #[serde(default)]
    pub ada: bool,
}

impl Door {
    /// Create a door with only an identifier.
    #[must_use]
    pub const fn new(id: DoorId) -> Self {
        Self {
            id,
            mark: None,
            door_use: None,
            zone: None,
            level: None,
            qty: None,
            material: None,
            fire_rating: None,
            ada: false,
        }
    }

    /// Set the zone.
    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Set the floor level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Set the use/function.
    #[must_use]
    pub fn with_use(mut self, door_use: impl Into<String>) -> Self {
        self.door_use = Some(door_use.into());
        self
    }

    /// Set the mark.
    #[must_use]
    pub fn with_mark(mut self, mark: impl Into<String>) -> Self {
        self.mark = Some(mark.into());
        self
    }

    /// Set the leaf quantity.
    #[must_use]
    pub const fn with_qty(mut self, qty: u32) -> Self {
        self.qty = Some(qty);
        self
    }

    /// The attribute the approach groups by, if present and non-blank.
    ///
    /// `DoorCount` does not group by an attribute and always returns `None`.
    #[must_use]
    pub fn grouping_attribute(&self, approach: KeyingApproach) -> Option<&str> {
        let value = match approach {
            KeyingApproach::ZoneBased => self.zone.as_deref(),
            KeyingApproach::FloorBased => self.level.as_deref(),
            KeyingApproach::Functional => self.door_use.as_deref(),
            KeyingApproach::DoorCount => None,
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Cylinders needed for this row: one per leaf, at least one.
    #[must_use]
    pub fn cylinders(&self) -> u32 {
        self.qty.filter(|q| *q > 0).unwrap_or(1)
    }
}

/// A key in the hierarchy above the change keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevel {
    /// Unique identifier.
    pub id: HierarchyId,
    /// Human name, e.g. "East Master".
    pub name: String,
    /// Level code from the standard, e.g. `GMK`.
    pub level_type: String,
    /// Key symbol; its grammar depends on the standard.
    pub key_symbol: String,
    /// Depth in the tree, 0 = top.
    pub order: u32,
    /// Parent level, `None` only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<HierarchyId>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Whether the level was produced by the hierarchy generator.
    #[serde(default)]
    pub auto_generated: bool,
    /// Physical keys to cut for this level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_quantity: Option<u32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl HierarchyLevel {
    /// Whether this is the top of the tree.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.order == 0
    }

    /// Physical keys counted for this level.
    #[must_use]
    pub fn effective_key_quantity(&self) -> u32 {
        self.key_quantity
            .filter(|q| *q > 0)
            .unwrap_or(DEFAULT_KEY_QUANTITY)
    }
}

/// A descriptive grouping of doors.
///
/// Zones do not own doors or assignments; deleting one cascades nowhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Unique identifier.
    pub id: ZoneId,
    /// Zone name.
    pub name: String,
    /// Display color, e.g. `#EF4444`.
    pub color: String,
    /// Number of doors in the zone when it was derived.
    #[serde(default)]
    pub door_count: u32,
    /// Whether the zone was derived from door data.
    #[serde(default)]
    pub auto_generated: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Keyed-differ or keyed-alike tag of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Keyed differ: the door has its own change key.
    #[serde(rename = "KD")]
    KeyedDiffer,
    /// Keyed alike: the door shares a change key with its group.
    #[serde(rename = "KA")]
    KeyedAlike,
}

impl KeyType {
    /// Short code, `KD` or `KA`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeyedDiffer => "KD",
            Self::KeyedAlike => "KA",
        }
    }
}

/// How an assigned door is keyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key_type")]
pub enum Keying {
    /// The door has its own change key.
    #[serde(rename = "KD")]
    KeyedDiffer {
        /// Physical keys to cut for this door.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key_quantity: Option<u32>,
    },
    /// The door shares its group's change key; the group carries the quantity.
    #[serde(rename = "KA")]
    KeyedAlike {
        /// Owning group.
        ka_group_id: KaGroupId,
        /// Group name, denormalized for display.
        ka_group_name: String,
    },
}

/// Maps one door to the master it lives under and its change key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned door.
    pub door_id: DoorId,
    /// Master the door lives under.
    pub hierarchy_id: HierarchyId,
    /// Change-key symbol.
    pub key_symbol: String,
    /// KD or KA payload.
    #[serde(flatten)]
    pub keying: Keying,
    /// When the assignment was made.
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    /// Create a keyed-differ assignment.
    #[must_use]
    pub fn keyed_differ(
        door_id: DoorId,
        hierarchy_id: HierarchyId,
        key_symbol: impl Into<String>,
        key_quantity: Option<u32>,
    ) -> Self {
        Self {
            door_id,
            hierarchy_id,
            key_symbol: key_symbol.into(),
            keying: Keying::KeyedDiffer { key_quantity },
            assigned_at: Utc::now(),
        }
    }

    /// Create a keyed-alike assignment for a group member.
    #[must_use]
    pub fn keyed_alike(door_id: DoorId, group: &KaGroup) -> Self {
        Self {
            door_id,
            hierarchy_id: group.master_id,
            key_symbol: group.key_symbol.clone(),
            keying: Keying::KeyedAlike {
                ka_group_id: group.id,
                ka_group_name: group.name.clone(),
            },
            assigned_at: Utc::now(),
        }
    }

    /// KD or KA.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self.keying {
            Keying::KeyedDiffer { .. } => KeyType::KeyedDiffer,
            Keying::KeyedAlike { .. } => KeyType::KeyedAlike,
        }
    }

    /// Physical keys attributed to this door: its own for KD, 0 for KA.
    #[must_use]
    pub fn key_quantity(&self) -> u32 {
        match self.keying {
            Keying::KeyedDiffer { key_quantity } => key_quantity
                .filter(|q| *q > 0)
                .unwrap_or(DEFAULT_KEY_QUANTITY),
            Keying::KeyedAlike { .. } => 0,
        }
    }

    /// The keyed-alike group, if any.
    #[must_use]
    pub const fn ka_group_id(&self) -> Option<KaGroupId> {
        match self.keying {
            Keying::KeyedDiffer { .. } => None,
            Keying::KeyedAlike { ka_group_id, .. } => Some(ka_group_id),
        }
    }
}

/// A set of doors sharing one change key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KaGroup {
    /// Unique identifier.
    pub id: KaGroupId,
    /// Group name.
    pub name: String,
    /// Shared change-key symbol.
    pub key_symbol: String,
    /// Master the group lives under.
    pub master_id: HierarchyId,
    /// Symbol of that master when the group was created.
    pub master_symbol: String,
    /// Member doors, at least two.
    pub door_ids: Vec<DoorId>,
    /// Physical keys cut for the whole group.
    pub key_quantity: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Capacity tier reported for a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    /// Up to 100 differs.
    Excellent,
    /// Up to 500 differs.
    Good,
    /// Up to 1000 differs; a professional should review the bitting.
    ConsultProfessional,
    /// More than 1000 differs.
    AtCapacity,
}

impl CapacityStatus {
    /// Tier for a number of differs in use.
    #[must_use]
    pub const fn for_differs(differs_used: u64) -> Self {
        match differs_used {
            0..=100 => Self::Excellent,
            101..=500 => Self::Good,
            501..=1000 => Self::ConsultProfessional,
            _ => Self::AtCapacity,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::ConsultProfessional => "Consult Professional",
            Self::AtCapacity => "At Capacity",
        }
    }
}

/// Derived usage counters for a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    /// Distinct key symbols across hierarchy levels and assignments.
    pub differs_used: u64,
    /// Ceiling of the active standard.
    pub max_differs: u64,
    /// Physical keys to cut.
    pub total_physical_keys: u64,
    /// Cylinders to install.
    pub total_cylinders: u64,
}

impl CapacitySnapshot {
    /// Differs still available; zero when over capacity.
    #[must_use]
    pub const fn differs_remaining(&self) -> u64 {
        self.max_differs.saturating_sub(self.differs_used)
    }

    /// `differs_used / max_differs`, 0 when the ceiling is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn usage_ratio(&self) -> f64 {
        if self.max_differs == 0 {
            return 0.0;
        }
        self.differs_used as f64 / self.max_differs as f64
    }

    /// Usage as a percentage.
    #[must_use]
    pub fn usage_percentage(&self) -> f64 {
        self.usage_ratio() * 100.0
    }

    /// Whether the design uses more differs than the standard provides.
    #[must_use]
    pub const fn exceeds_capacity(&self) -> bool {
        self.differs_used > self.max_differs
    }

    /// Reporting tier.
    #[must_use]
    pub const fn status(&self) -> CapacityStatus {
        CapacityStatus::for_differs(self.differs_used)
    }
}

/// Every record of one project, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    /// Keying configuration.
    #[serde(default)]
    pub config: ProjectConfig,
    /// Door schedule rows.
    #[serde(default)]
    pub doors: Vec<Door>,
    /// Hierarchy levels.
    #[serde(default)]
    pub hierarchies: Vec<HierarchyLevel>,
    /// Zones.
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Door assignments.
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    /// Keyed-alike groups.
    #[serde(default)]
    pub ka_groups: Vec<KaGroup>,
    /// Last computed capacity.
    #[serde(default)]
    pub capacity: CapacitySnapshot,
}
