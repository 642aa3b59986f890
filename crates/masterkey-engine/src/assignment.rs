//! Auto-assignment planning.
//!
//! A plan maps every unassigned door to a master and a change-key symbol.
//! Planning is a pure computation over a snapshot of the design; applying a
//! plan is a separate step on the service.

use std::collections::{HashMap, HashSet};

use masterkey_core::{DoorId, HierarchyId, KeyingApproach, StandardId};
use masterkey_store::{Door, HierarchyLevel};
use serde::{Deserialize, Serialize};

use crate::grouping::derive_groups;
use crate::symbols::SymbolAllocator;
use crate::types::{DesignSnapshot, EngineConfig};

/// Short reference to a master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRef {
    /// Level id.
    pub id: HierarchyId,
    /// Key symbol.
    pub symbol: String,
    /// Level name.
    pub name: String,
}

impl From<&HierarchyLevel> for MasterRef {
    fn from(level: &HierarchyLevel) -> Self {
        Self {
            id: level.id,
            symbol: level.key_symbol.clone(),
            name: level.name.clone(),
        }
    }
}

/// A door the plan would assign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAssignment {
    /// The door.
    pub door_id: DoorId,
    /// Change-key symbol.
    pub change_key_symbol: String,
    /// Display name of the change key.
    pub change_key_name: String,
    /// The master the door lands under.
    pub master: MasterRef,
    /// Masters above it, nearest first.
    pub parent_masters: Vec<MasterRef>,
    /// The door's group.
    pub group_name: String,
}

/// Doors planned under one master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterCount {
    /// The master.
    pub master: MasterRef,
    /// Doors planned under it.
    pub count: u32,
    /// First group matched to it.
    pub group_name: String,
}

/// Result of auto-assignment planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPlan {
    /// Planned assignments in group order.
    pub assignments: Vec<PlannedAssignment>,
    /// Per-master totals, in the order masters were first matched.
    pub master_counts: Vec<MasterCount>,
    /// Number of change keys the plan creates.
    pub total_change_keys: u32,
    /// Doors whose group matched no master.
    pub unassigned_doors: Vec<DoorId>,
}

impl AssignmentPlan {
    /// Whether the plan assigns nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Planned change keys under a master.
    pub fn change_keys_for(&self, master_id: HierarchyId) -> impl Iterator<Item = &PlannedAssignment> {
        self.assignments
            .iter()
            .filter(move |a| a.master.id == master_id)
    }
}

/// Group label of a master: its name without a trailing " Master".
fn master_label(name: &str) -> &str {
    name.strip_suffix(" Master").unwrap_or(name)
}

/// Find the master a door group belongs under.
///
/// Tries, in order: a case-insensitive exact match against the master's name
/// or its group label, then any pair of words where one contains the other.
/// Returns `None` when nothing matches; callers must not guess.
#[must_use]
pub fn match_group_to_master<'a>(
    group_name: &str,
    masters: &'a [HierarchyLevel],
) -> Option<&'a HierarchyLevel> {
    let group = group_name.trim().to_lowercase();
    if group.is_empty() {
        return None;
    }

    let exact = masters.iter().find(|m| {
        let name = m.name.to_lowercase();
        name == group || master_label(&name) == group
    });
    if exact.is_some() {
        return exact;
    }

    let group_words: Vec<&str> = group.split_whitespace().collect();
    masters.iter().find(|m| {
        let name = m.name.to_lowercase();
        name.split_whitespace().any(|mw| {
            group_words
                .iter()
                .any(|gw| mw.contains(gw) || gw.contains(mw))
        })
    })
}

/// Levels doors can be assigned under: every non-root level, in stored order.
#[must_use]
pub fn master_candidates(hierarchies: &[HierarchyLevel]) -> Vec<HierarchyLevel> {
    hierarchies
        .iter()
        .filter(|h| h.order > 0)
        .cloned()
        .collect()
}

/// Display name for a door's change key.
#[must_use]
pub fn change_key_name(door: &Door, group_name: Option<&str>) -> String {
    let present = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(mark) = present(door.mark.as_deref()) {
        format!("Door {mark} Key")
    } else if let Some(door_use) = present(door.door_use.as_deref()) {
        format!("{door_use} Key")
    } else if let Some(group) = group_name.filter(|g| !g.trim().is_empty()) {
        format!("{group} Key {}", door.id.tail(4))
    } else {
        format!("Change Key {}", door.id.tail(4))
    }
}

/// Masters above a level, nearest first, ending with the top key.
#[must_use]
pub fn parent_masters<'a>(
    master_id: HierarchyId,
    hierarchies: &'a [HierarchyLevel],
) -> Vec<&'a HierarchyLevel> {
    let by_id: HashMap<HierarchyId, &HierarchyLevel> =
        hierarchies.iter().map(|h| (h.id, h)).collect();
    let mut parents: Vec<&HierarchyLevel> = Vec::new();
    let mut seen = HashSet::from([master_id]);

    let mut current = by_id.get(&master_id).copied();
    while let Some(parent) = current
        .and_then(|level| level.parent_id)
        .and_then(|id| by_id.get(&id).copied())
    {
        if !seen.insert(parent.id) {
            break;
        }
        parents.push(parent);
        current = Some(parent);
    }

    if let Some(top) = hierarchies
        .iter()
        .find(|h| h.parent_id.is_none() && h.id != master_id)
    {
        if !parents.iter().any(|p| p.id == top.id) {
            parents.push(top);
        }
    }

    parents
}

/// Plan change keys for every door that has no assignment yet.
///
/// Doors are grouped by `approach`, each group is matched to a master with
/// [`match_group_to_master`], and each door gets the next free symbol from
/// its master's counter. Doors in unmatched groups are reported in
/// `unassigned_doors` and get no symbol.
#[must_use]
pub fn generate_auto_assignment_plan(
    input: &DesignSnapshot<'_>,
    standard: StandardId,
    approach: KeyingApproach,
    config: &EngineConfig,
) -> AssignmentPlan {
    let assigned: HashSet<&DoorId> = input.assignments.iter().map(|a| &a.door_id).collect();
    let pending: Vec<Door> = input
        .doors
        .iter()
        .filter(|d| !assigned.contains(&d.id))
        .cloned()
        .collect();
    let doors_by_id: HashMap<&DoorId, &Door> = pending.iter().map(|d| (&d.id, d)).collect();

    let masters = master_candidates(input.hierarchies);
    let mut allocator = SymbolAllocator::new(
        standard,
        input.hierarchies,
        input.assignments,
        input.ka_groups,
    );

    let mut plan = AssignmentPlan::default();
    let mut count_index: HashMap<HierarchyId, usize> = HashMap::new();

    for (group_name, door_ids) in derive_groups(&pending, approach, config) {
        let Some(master) = match_group_to_master(&group_name, &masters) else {
            tracing::warn!(
                group = %group_name,
                doors = door_ids.len(),
                "No master matches door group"
            );
            plan.unassigned_doors.extend(door_ids);
            continue;
        };

        let parents: Vec<MasterRef> = parent_masters(master.id, input.hierarchies)
            .into_iter()
            .map(MasterRef::from)
            .collect();
        let slot = *count_index.entry(master.id).or_insert_with(|| {
            plan.master_counts.push(MasterCount {
                master: MasterRef::from(master),
                count: 0,
                group_name: group_name.clone(),
            });
            plan.master_counts.len() - 1
        });

        for door_id in door_ids {
            let symbol = allocator.next_change_key(master);
            let name = doors_by_id.get(&door_id).map_or_else(
                || format!("Change Key {}", door_id.tail(4)),
                |door| change_key_name(door, Some(&group_name)),
            );

            plan.assignments.push(PlannedAssignment {
                door_id,
                change_key_symbol: symbol,
                change_key_name: name,
                master: MasterRef::from(master),
                parent_masters: parents.clone(),
                group_name: group_name.clone(),
            });
            plan.master_counts[slot].count += 1;
            plan.total_change_keys += 1;
        }
    }

    tracing::debug!(
        planned = plan.total_change_keys,
        unassigned = plan.unassigned_doors.len(),
        masters = plan.master_counts.len(),
        "Generated auto-assignment plan"
    );

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use masterkey_store::Assignment;

    fn level(name: &str, symbol: &str, order: u32, parent: Option<HierarchyId>) -> HierarchyLevel {
        HierarchyLevel {
            id: HierarchyId::generate(),
            name: name.to_string(),
            level_type: "MK".to_string(),
            key_symbol: symbol.to_string(),
            order,
            parent_id: parent,
            description: String::new(),
            auto_generated: true,
            key_quantity: None,
            created_at: Utc::now(),
        }
    }

    fn door(id: &str) -> Door {
        Door::new(DoorId::new(id).unwrap())
    }

    fn ansi_tree() -> Vec<HierarchyLevel> {
        let root = level("Grand Master Key", "A", 0, None);
        let east = level("East Master", "AA", 1, Some(root.id));
        let west = level("West Master", "AB", 1, Some(root.id));
        vec![root, east, west]
    }

    #[test]
    fn exact_match_ignores_case_and_master_suffix() {
        let levels = ansi_tree();
        let masters = master_candidates(&levels);
        assert_eq!(match_group_to_master("east", &masters).unwrap().key_symbol, "AA");
        assert_eq!(match_group_to_master("WEST MASTER", &masters).unwrap().key_symbol, "AB");
    }

    #[test]
    fn partial_match_uses_word_overlap() {
        let masters = vec![level("Admin Block Master", "AA", 1, None)];
        assert!(match_group_to_master("Administration", &masters).is_some());
        assert!(match_group_to_master("Block", &masters).is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let masters = master_candidates(&ansi_tree());
        assert!(match_group_to_master("Basement", &masters).is_none());
        assert!(match_group_to_master("  ", &masters).is_none());
    }

    #[test]
    fn change_key_names_prefer_mark_then_use() {
        let d = door("door-0042").with_mark("101").with_use("Office");
        assert_eq!(change_key_name(&d, Some("East")), "Door 101 Key");
        let d = door("door-0042").with_use("Office");
        assert_eq!(change_key_name(&d, Some("East")), "Office Key");
        let d = door("door-0042");
        assert_eq!(change_key_name(&d, Some("East")), "East Key 0042");
        assert_eq!(change_key_name(&d, None), "Change Key 0042");
    }

    #[test]
    fn parent_masters_walk_to_the_root() {
        let root = level("GM", "A", 0, None);
        let gm = level("East", "AA", 1, Some(root.id));
        let sub = level("East Wing", "AAA", 2, Some(gm.id));
        let levels = vec![root.clone(), gm.clone(), sub.clone()];

        let parents: Vec<_> = parent_masters(sub.id, &levels)
            .into_iter()
            .map(|l| l.key_symbol.clone())
            .collect();
        assert_eq!(parents, vec!["AA", "A"]);
        assert!(parent_masters(root.id, &levels).is_empty());
    }

    #[test]
    fn plan_uses_per_master_counters() {
        let levels = ansi_tree();
        let doors = vec![
            door("E1").with_zone("East"),
            door("W1").with_zone("West"),
            door("E2").with_zone("East"),
        ];
        let input = DesignSnapshot {
            doors: &doors,
            hierarchies: &levels,
            assignments: &[],
            ka_groups: &[],
        };
        let plan = generate_auto_assignment_plan(
            &input,
            StandardId::AnsiBhma,
            KeyingApproach::ZoneBased,
            &EngineConfig::default(),
        );

        let symbols: Vec<_> = plan
            .assignments
            .iter()
            .map(|a| (a.door_id.as_str().to_string(), a.change_key_symbol.clone()))
            .collect();
        assert_eq!(
            symbols,
            vec![
                ("E1".to_string(), "AA1".to_string()),
                ("E2".to_string(), "AA2".to_string()),
                ("W1".to_string(), "AB1".to_string()),
            ]
        );
        assert_eq!(plan.total_change_keys, 3);
        assert_eq!(plan.master_counts.len(), 2);
        assert_eq!(plan.assignments[0].parent_masters[0].symbol, "A");
    }

    #[test]
    fn unmatched_groups_are_reported_not_guessed() {
        let levels = ansi_tree();
        let doors = vec![door("E1").with_zone("East"), door("B1").with_zone("Basement"), door("X1")];
        let input = DesignSnapshot {
            doors: &doors,
            hierarchies: &levels,
            assignments: &[],
            ka_groups: &[],
        };
        let plan = generate_auto_assignment_plan(
            &input,
            StandardId::AnsiBhma,
            KeyingApproach::ZoneBased,
            &EngineConfig::default(),
        );

        assert_eq!(plan.total_change_keys, 1);
        let mut unassigned: Vec<_> = plan.unassigned_doors.iter().map(DoorId::as_str).collect();
        unassigned.sort_unstable();
        assert_eq!(unassigned, vec!["B1", "X1"]);
    }

    #[test]
    fn plan_skips_assigned_doors_and_continues_numbering() {
        let levels = ansi_tree();
        let east = levels[1].clone();
        let doors = vec![
            door("E1").with_zone("East"),
            door("E2").with_zone("East"),
            door("E3").with_zone("East"),
        ];
        let assignments = vec![
            Assignment::keyed_differ(DoorId::new("E1").unwrap(), east.id, "AA1", None),
            Assignment::keyed_differ(DoorId::new("E2").unwrap(), east.id, "AA2", None),
        ];
        let input = DesignSnapshot {
            doors: &doors,
            hierarchies: &levels,
            assignments: &assignments,
            ka_groups: &[],
        };
        let plan = generate_auto_assignment_plan(
            &input,
            StandardId::AnsiBhma,
            KeyingApproach::ZoneBased,
            &EngineConfig::default(),
        );

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].change_key_symbol, "AA3");
        assert_eq!(plan.change_keys_for(east.id).count(), 1);
    }
}
