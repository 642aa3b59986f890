//! Differs, physical keys and cylinders.

use std::collections::{HashMap, HashSet};

use masterkey_core::{DoorId, HierarchyId, KaGroupId, Standard};
use masterkey_store::{
    Assignment, CapacitySnapshot, CapacityStatus, Door, HierarchyLevel, KaGroup, Keying,
};
use serde::{Deserialize, Serialize};

/// Distinct key symbols across hierarchy levels and assignments.
#[must_use]
pub fn differs_used(hierarchies: &[HierarchyLevel], assignments: &[Assignment]) -> u64 {
    let symbols: HashSet<&str> = hierarchies
        .iter()
        .map(|h| h.key_symbol.as_str())
        .chain(assignments.iter().map(|a| a.key_symbol.as_str()))
        .collect();
    symbols.len() as u64
}

/// Recompute the capacity snapshot of a design.
///
/// Keyed-differ doors add their own key quantity. Keyed-alike groups add
/// theirs once, however many members they have. Every assigned door adds
/// one cylinder per leaf.
#[must_use]
pub fn compute_capacity(
    standard: &Standard,
    doors: &[Door],
    hierarchies: &[HierarchyLevel],
    assignments: &[Assignment],
    ka_groups: &[KaGroup],
) -> CapacitySnapshot {
    let doors_by_id: HashMap<&DoorId, &Door> = doors.iter().map(|d| (&d.id, d)).collect();
    let groups_by_id: HashMap<KaGroupId, &KaGroup> = ka_groups.iter().map(|g| (g.id, g)).collect();

    let mut total_physical_keys: u64 = hierarchies
        .iter()
        .map(|h| u64::from(h.effective_key_quantity()))
        .sum();
    let mut total_cylinders: u64 = 0;
    let mut counted_groups: HashSet<KaGroupId> = HashSet::new();

    for assignment in assignments {
        match &assignment.keying {
            Keying::KeyedDiffer { .. } => {
                total_physical_keys += u64::from(assignment.key_quantity());
            }
            Keying::KeyedAlike { ka_group_id, .. } => {
                if counted_groups.insert(*ka_group_id) {
                    total_physical_keys += groups_by_id
                        .get(ka_group_id)
                        .map_or(0, |g| u64::from(g.key_quantity));
                }
            }
        }
        total_cylinders += doors_by_id
            .get(&assignment.door_id)
            .map_or(1, |d| u64::from(d.cylinders()));
    }

    CapacitySnapshot {
        differs_used: differs_used(hierarchies, assignments),
        max_differs: standard.max_differs,
        total_physical_keys,
        total_cylinders,
    }
}

/// Capacity snapshot with its derived figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    /// The raw snapshot.
    #[serde(flatten)]
    pub snapshot: CapacitySnapshot,
    /// Differs still available.
    pub differs_remaining: u64,
    /// Usage as a percentage of the ceiling.
    pub usage_percentage: f64,
    /// Reporting tier.
    pub status: CapacityStatus,
    /// Display label of the tier.
    pub status_label: String,
}

impl From<CapacitySnapshot> for CapacityReport {
    fn from(snapshot: CapacitySnapshot) -> Self {
        let status = snapshot.status();
        Self {
            differs_remaining: snapshot.differs_remaining(),
            usage_percentage: snapshot.usage_percentage(),
            status,
            status_label: status.label().to_string(),
            snapshot,
        }
    }
}

/// Doors assigned under one hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterStats {
    /// Level id.
    pub hierarchy_id: HierarchyId,
    /// Key symbol.
    pub symbol: String,
    /// Level name.
    pub name: String,
    /// Doors assigned directly under it.
    pub assigned_count: usize,
}

/// Assignment progress of a design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStats {
    /// Doors in the schedule.
    pub total_doors: usize,
    /// Doors with an assignment.
    pub assigned_doors: usize,
    /// Doors without one.
    pub unassigned_doors: usize,
    /// Assigned share, rounded to a whole percent.
    pub progress_percentage: u32,
    /// Per-level counts in stored order.
    pub master_stats: Vec<MasterStats>,
}

/// Count assigned doors overall and per level.
#[must_use]
pub fn assignment_stats(
    doors: &[Door],
    hierarchies: &[HierarchyLevel],
    assignments: &[Assignment],
) -> AssignmentStats {
    let assigned: HashSet<&DoorId> = assignments.iter().map(|a| &a.door_id).collect();
    let assigned_doors = doors.iter().filter(|d| assigned.contains(&d.id)).count();
    let total_doors = doors.len();

    let progress_percentage = if total_doors == 0 {
        0
    } else {
        let pct = (assigned_doors * 100 + total_doors / 2) / total_doors;
        u32::try_from(pct).unwrap_or(100)
    };

    let mut per_level: HashMap<HierarchyId, usize> = HashMap::new();
    for assignment in assignments {
        *per_level.entry(assignment.hierarchy_id).or_insert(0) += 1;
    }

    AssignmentStats {
        total_doors,
        assigned_doors,
        unassigned_doors: total_doors - assigned_doors,
        progress_percentage,
        master_stats: hierarchies
            .iter()
            .map(|h| MasterStats {
                hierarchy_id: h.id,
                symbol: h.key_symbol.clone(),
                name: h.name.clone(),
                assigned_count: per_level.get(&h.id).copied().unwrap_or(0),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use masterkey_core::{get_standard, StandardId};

    fn level(symbol: &str, quantity: Option<u32>) -> HierarchyLevel {
        HierarchyLevel {
            id: HierarchyId::generate(),
            name: symbol.to_string(),
            level_type: "MK".to_string(),
            key_symbol: symbol.to_string(),
            order: 1,
            parent_id: None,
            description: String::new(),
            auto_generated: false,
            key_quantity: quantity,
            created_at: Utc::now(),
        }
    }

    fn door(id: &str, qty: u32) -> Door {
        Door::new(DoorId::new(id).unwrap()).with_qty(qty)
    }

    fn ka_group(master: &HierarchyLevel, members: &[&str], quantity: u32) -> KaGroup {
        KaGroup {
            id: KaGroupId::generate(),
            name: "Stores".to_string(),
            key_symbol: format!("{}10", master.key_symbol),
            master_id: master.id,
            master_symbol: master.key_symbol.clone(),
            door_ids: members.iter().map(|m| DoorId::new(*m).unwrap()).collect(),
            key_quantity: quantity,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn kd_totals_use_defaults() {
        let master = level("AA", None);
        let doors = vec![door("D1", 1), door("D2", 2)];
        let assignments = vec![
            Assignment::keyed_differ(doors[0].id.clone(), master.id, "AA1", None),
            Assignment::keyed_differ(doors[1].id.clone(), master.id, "AA2", Some(4)),
        ];
        let snapshot = compute_capacity(
            get_standard(StandardId::AnsiBhma),
            &doors,
            &[master],
            &assignments,
            &[],
        );

        assert_eq!(snapshot.differs_used, 3);
        assert_eq!(snapshot.total_physical_keys, 2 + 2 + 4);
        assert_eq!(snapshot.total_cylinders, 3);
        assert_eq!(snapshot.max_differs, 117_649);
    }

    #[test]
    fn ka_group_counts_once() {
        let master = level("AA", Some(1));
        let members = ["D1", "D2", "D3", "D4", "D5"];
        let doors: Vec<_> = members.iter().map(|m| door(m, 1)).collect();
        let group = ka_group(&master, &members, 8);
        let assignments: Vec<_> = doors
            .iter()
            .map(|d| Assignment::keyed_alike(d.id.clone(), &group))
            .collect();

        let snapshot = compute_capacity(
            get_standard(StandardId::AnsiBhma),
            &doors,
            &[master],
            &assignments,
            &[group],
        );

        assert_eq!(snapshot.differs_used, 2);
        assert_eq!(snapshot.total_physical_keys, 1 + 8);
        assert_eq!(snapshot.total_cylinders, 5);
    }

    #[test]
    fn report_derives_status_and_remaining() {
        let snapshot = CapacitySnapshot {
            differs_used: 600,
            max_differs: 7776,
            total_physical_keys: 0,
            total_cylinders: 0,
        };
        let report = CapacityReport::from(snapshot);
        assert_eq!(report.differs_remaining, 7176);
        assert_eq!(report.status, CapacityStatus::ConsultProfessional);
        assert_eq!(report.status_label, "Consult Professional");
        assert!((report.usage_percentage - 7.716).abs() < 0.01);
    }

    #[test]
    fn stats_count_progress_per_master() {
        let master = level("AA", None);
        let other = level("AB", None);
        let doors = vec![door("D1", 1), door("D2", 1), door("D3", 1)];
        let assignments = vec![Assignment::keyed_differ(
            doors[0].id.clone(),
            master.id,
            "AA1",
            None,
        )];
        let stats = assignment_stats(&doors, &[master.clone(), other], &assignments);

        assert_eq!(stats.assigned_doors, 1);
        assert_eq!(stats.unassigned_doors, 2);
        assert_eq!(stats.progress_percentage, 33);
        assert_eq!(stats.master_stats[0].assigned_count, 1);
        assert_eq!(stats.master_stats[1].assigned_count, 0);
    }

    #[test]
    fn stats_on_empty_schedule() {
        let stats = assignment_stats(&[], &[], &[]);
        assert_eq!(stats.progress_percentage, 0);
    }
}
