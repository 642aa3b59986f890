//! Hierarchy generation, preview, templates and tree building.
//!
//! Generation is id-agnostic: it returns [`LevelDraft`]s that reference their
//! parent by order, and [`materialize`] assigns identifiers when the drafts
//! are persisted. Only the top key and the master tier are generated; change
//! keys come into existence when doors are assigned.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use masterkey_core::{
    describe_depth, get_recommended_hierarchy, FacilityType, HierarchyId, KeyingApproach,
    StandardId,
};
use masterkey_store::{Door, HierarchyLevel};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::grouping::{self, derive_groups, group_names};
use crate::symbols::{generate_key_symbol, KeyTier};
use crate::types::{EngineConfig, HierarchyRequest};

/// A hierarchy level before it has an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDraft {
    /// Human name.
    pub name: String,
    /// Level code, e.g. `GMK`.
    pub level_type: String,
    /// Key symbol.
    pub key_symbol: String,
    /// Depth in the tree, 0 = top.
    pub order: u32,
    /// Order of the parent level; `None` for the root.
    pub parent_order: Option<u32>,
    /// Free-text description.
    pub description: String,
    /// Door group the level was named after.
    pub group_name: Option<String>,
}

/// Number of masters to generate for a door set.
///
/// Counts distinct zones, floors, or uses (at most
/// `config.max_functional_groups`), or one master per
/// `config.doors_per_master` doors, then clamps the result to
/// `[config.min_masters, config.max_masters]`. An empty schedule gets
/// `config.masters_without_doors`.
#[must_use]
pub fn estimate_master_count(
    doors: &[Door],
    approach: KeyingApproach,
    config: &EngineConfig,
) -> u32 {
    if doors.is_empty() {
        return config.masters_without_doors;
    }

    let count = match approach {
        KeyingApproach::ZoneBased | KeyingApproach::FloorBased => doors
            .iter()
            .filter_map(|d| d.grouping_attribute(approach))
            .collect::<HashSet<_>>()
            .len(),
        KeyingApproach::Functional => doors
            .iter()
            .filter_map(|d| d.grouping_attribute(approach))
            .collect::<HashSet<_>>()
            .len()
            .min(config.max_functional_groups),
        KeyingApproach::DoorCount => doors.len().div_ceil(config.doors_per_master.max(1)),
    };

    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .clamp(config.min_masters, config.max_masters)
}

fn root_name(standard: StandardId) -> &'static str {
    match standard {
        StandardId::AnsiBhma => "Grand Master Key",
        StandardId::En1303 => "General Master Key",
    }
}

fn level_types(standard: StandardId, depth: u32) -> (&'static str, &'static str) {
    match standard {
        StandardId::AnsiBhma if depth == 4 => ("GGM", "GMK"),
        StandardId::AnsiBhma => ("GMK", "MK"),
        StandardId::En1303 => ("GM", "MK"),
    }
}

/// Generate the levels a hierarchy would have: one root and, for depth 2 or
/// more, one master per estimated group.
///
/// # Errors
///
/// Returns `EngineError::InvalidDepth` for depths outside 1 to 4 and
/// `EngineError::SymbolSpaceExhausted` if the masters run out of letters.
pub fn generate_hierarchy_levels(
    request: &HierarchyRequest,
    doors: &[Door],
    config: &EngineConfig,
) -> Result<Vec<LevelDraft>> {
    if !(1..=4).contains(&request.depth) {
        return Err(EngineError::InvalidDepth {
            depth: request.depth,
        });
    }

    let (root_type, master_type) = level_types(request.standard, request.depth);
    let root_symbol = generate_key_symbol(request.standard, KeyTier::Top, 0, None)?;
    let root = root_name(request.standard);

    let mut levels = vec![LevelDraft {
        name: root.to_string(),
        level_type: root_type.to_string(),
        key_symbol: root_symbol.clone(),
        order: 0,
        parent_order: None,
        description: format!(
            "{root} - Opens all doors in {}",
            request.facility_type.display_name()
        ),
        group_name: None,
    }];

    if request.depth >= 2 {
        let count = estimate_master_count(doors, request.approach, config);
        let names = group_names(doors, request.approach, config);

        for index in 0..count {
            let group = names
                .get(index as usize)
                .cloned()
                .unwrap_or_else(|| grouping::chunk_name(index as usize));
            let key_symbol =
                generate_key_symbol(request.standard, KeyTier::Master, index, Some(&root_symbol))?;

            levels.push(LevelDraft {
                name: format!("{group} Master"),
                level_type: master_type.to_string(),
                key_symbol,
                order: 1,
                parent_order: Some(0),
                description: format!("Master key for {group}"),
                group_name: Some(group),
            });
        }
    }

    tracing::debug!(
        standard = %request.standard,
        depth = request.depth,
        approach = %request.approach,
        levels = levels.len(),
        "Generated hierarchy levels"
    );

    Ok(levels)
}

/// Levels recommended for a facility type, linked top to bottom.
///
/// Names and level codes come from the standard's recommendation; symbols
/// come from the symbol grammar. The change-key tier is not materialized.
///
/// # Errors
///
/// Returns `EngineError::SymbolSpaceExhausted` if symbol generation fails.
pub fn template_levels(
    standard: StandardId,
    facility_type: FacilityType,
) -> Result<Vec<LevelDraft>> {
    let mut drafts: Vec<LevelDraft> = Vec::new();

    for definition in get_recommended_hierarchy(standard, facility_type)
        .into_iter()
        .filter(|d| !matches!(d.id, "CK" | "UK"))
    {
        let order = u32::try_from(drafts.len()).unwrap_or(u32::MAX);
        let parent_symbol = drafts.last().map(|d| d.key_symbol.as_str());
        let key_symbol =
            generate_key_symbol(standard, KeyTier::from_order(order), 0, parent_symbol)?;

        drafts.push(LevelDraft {
            name: definition.name.to_string(),
            level_type: definition.id.to_string(),
            key_symbol,
            order,
            parent_order: order.checked_sub(1),
            description: format!("{} for {}", definition.name, facility_type.display_name()),
            group_name: None,
        });
    }

    Ok(drafts)
}

/// Give drafts identifiers and resolve parent orders to parent ids.
///
/// A parent order resolves to the first draft at that order.
#[must_use]
pub fn materialize(
    drafts: &[LevelDraft],
    key_quantity: Option<u32>,
    now: DateTime<Utc>,
) -> Vec<HierarchyLevel> {
    let ids: Vec<HierarchyId> = drafts.iter().map(|_| HierarchyId::generate()).collect();
    let mut first_at_order: HashMap<u32, HierarchyId> = HashMap::new();
    for (draft, id) in drafts.iter().zip(&ids) {
        first_at_order.entry(draft.order).or_insert(*id);
    }

    drafts
        .iter()
        .zip(ids)
        .map(|(draft, id)| HierarchyLevel {
            id,
            name: draft.name.clone(),
            level_type: draft.level_type.clone(),
            key_symbol: draft.key_symbol.clone(),
            order: draft.order,
            parent_id: draft
                .parent_order
                .and_then(|order| first_at_order.get(&order).copied()),
            description: draft.description.clone(),
            auto_generated: true,
            key_quantity,
            created_at: now,
        })
        .collect()
}

/// One key in a preview tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewKey {
    /// Key symbol.
    pub symbol: String,
    /// Key name.
    pub name: String,
    /// Doors in the group the key was named after.
    pub door_count: usize,
}

/// One tier of a preview, 1 = top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLevel {
    /// Tier number.
    pub level: u32,
    /// Tier name.
    pub name: String,
    /// What the tier is for.
    pub description: String,
    /// Keys in the tier.
    pub count: u64,
    /// The keys themselves; empty for change-key tiers.
    pub keys: Vec<PreviewKey>,
}

/// What hierarchy generation would produce, without producing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyPreview {
    /// Active standard.
    pub standard: StandardId,
    /// Requested depth.
    pub depth: u32,
    /// Grouping approach.
    pub approach: KeyingApproach,
    /// Facility type.
    pub facility_type: FacilityType,
    /// Human summary of the depth.
    pub summary: String,
    /// Doors in the schedule.
    pub total_doors: usize,
    /// Tiers, top first.
    pub levels: Vec<PreviewLevel>,
    /// Keys the design would need, change keys included once.
    pub estimated_total_keys: u64,
}

/// Preview of [`generate_hierarchy_levels`] for the same inputs.
///
/// The preview is built from the same drafts generation returns, so its key
/// names and symbols always match what would be created.
///
/// # Errors
///
/// Returns the same errors as [`generate_hierarchy_levels`].
pub fn generate_hierarchy_preview(
    request: &HierarchyRequest,
    doors: &[Door],
    config: &EngineConfig,
) -> Result<HierarchyPreview> {
    let drafts = generate_hierarchy_levels(request, doors, config)?;
    let groups = derive_groups(doors, request.approach, config);
    let total_doors = doors.len();
    let ansi = request.standard == StandardId::AnsiBhma;

    let mut levels = Vec::new();
    let mut estimated_total_keys = 0;

    if let Some(root) = drafts.iter().find(|d| d.order == 0) {
        levels.push(PreviewLevel {
            level: 1,
            name: root.name.clone(),
            description: format!("Opens all {total_doors} doors"),
            count: 1,
            keys: vec![PreviewKey {
                symbol: root.key_symbol.clone(),
                name: root.name.clone(),
                door_count: total_doors,
            }],
        });
        estimated_total_keys += 1;
    }

    let masters: Vec<PreviewKey> = drafts
        .iter()
        .filter(|d| d.order == 1)
        .map(|d| PreviewKey {
            symbol: d.key_symbol.clone(),
            name: d.name.clone(),
            door_count: d
                .group_name
                .as_ref()
                .and_then(|g| groups.get(g))
                .map_or(0, Vec::len),
        })
        .collect();

    if request.depth >= 2 {
        let count = masters.len() as u64;
        levels.push(PreviewLevel {
            level: 2,
            name: "Master Keys".to_string(),
            description: format!("{count} master keys for {} organization", request.approach.label()),
            count,
            keys: masters,
        });
        estimated_total_keys += count;

        let change_keys = if total_doors > 0 {
            total_doors as u64
        } else {
            count * config.preview_change_keys_per_master
        };
        let change_name = if ansi { "Change Keys" } else { "User Keys" };

        if request.depth >= 3 {
            levels.push(PreviewLevel {
                level: 3,
                name: change_name.to_string(),
                description: "Created automatically when doors are assigned".to_string(),
                count: change_keys,
                keys: Vec::new(),
            });
            estimated_total_keys += change_keys;
        }

        if request.depth >= 4 {
            levels.push(PreviewLevel {
                level: 4,
                name: change_name.to_string(),
                description: "Individual room/door keys".to_string(),
                count: change_keys,
                keys: Vec::new(),
            });
        }
    }

    Ok(HierarchyPreview {
        standard: request.standard,
        depth: request.depth,
        approach: request.approach,
        facility_type: request.facility_type,
        summary: describe_depth(request.standard, request.depth).to_string(),
        total_doors,
        levels,
        estimated_total_keys,
    })
}

/// A hierarchy level with its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// The level.
    pub level: HierarchyLevel,
    /// Levels whose parent is this level, in stored order.
    pub children: Vec<HierarchyNode>,
}

/// Nest levels by their parent links.
///
/// Levels without a parent, or whose parent is missing, become roots.
/// Parent cycles are broken by visiting each level once.
#[must_use]
pub fn hierarchy_tree(levels: &[HierarchyLevel]) -> Vec<HierarchyNode> {
    let known: HashSet<HierarchyId> = levels.iter().map(|l| l.id).collect();
    let mut visited = HashSet::new();

    levels
        .iter()
        .filter(|l| l.parent_id.map_or(true, |p| !known.contains(&p)))
        .filter_map(|root| build_node(root, levels, &mut visited))
        .collect()
}

fn build_node(
    level: &HierarchyLevel,
    levels: &[HierarchyLevel],
    visited: &mut HashSet<HierarchyId>,
) -> Option<HierarchyNode> {
    if !visited.insert(level.id) {
        return None;
    }
    let children = levels
        .iter()
        .filter(|child| child.parent_id == Some(level.id))
        .filter_map(|child| build_node(child, levels, visited))
        .collect();
    Some(HierarchyNode {
        level: level.clone(),
        children,
    })
}
