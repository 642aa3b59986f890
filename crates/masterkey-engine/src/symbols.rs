//! Key symbol grammars.
//!
//! ANSI/BHMA A156.28 builds symbols by appending to the parent: `A`, `AA`,
//! `AAA`, then a numeric change-key suffix (`AA1`). EN 1303 uses descriptive
//! prefixes with numeric indices: `GMK`, `MK-1`, `SK-1`, `CK-101`. The two
//! grammars share nothing, so every function matches on the standard.
//!
//! All generators are deterministic in their arguments. [`SymbolAllocator`]
//! adds the per-master counters used when assigning doors.

use std::collections::{HashMap, HashSet};

use masterkey_core::{HierarchyId, StandardId};
use masterkey_store::{Assignment, HierarchyLevel, KaGroup};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Tier of a key in the generated hierarchy, 1 = top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyTier {
    /// Grand master / general master.
    Top = 1,
    /// Masters directly below the top key.
    Master = 2,
    /// Sub-masters.
    SubMaster = 3,
    /// Change keys.
    Change = 4,
}

impl KeyTier {
    /// Tier of a hierarchy level by its order, 0 = top.
    #[must_use]
    pub const fn from_order(order: u32) -> Self {
        match order {
            0 => Self::Top,
            1 => Self::Master,
            2 => Self::SubMaster,
            _ => Self::Change,
        }
    }
}

/// Letter for a sibling index, `A` for 0.
fn sibling_letter(index: u32, parent: &str) -> Result<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
        .ok_or_else(|| EngineError::SymbolSpaceExhausted {
            parent: parent.to_string(),
            index,
        })
}

/// Generate the symbol of a key at `tier`, the `sibling_index`-th under its parent.
///
/// # Errors
///
/// Returns `EngineError::SymbolSpaceExhausted` if an ANSI letter tier is
/// asked for a 27th sibling.
pub fn generate_key_symbol(
    standard: StandardId,
    tier: KeyTier,
    sibling_index: u32,
    parent_symbol: Option<&str>,
) -> Result<String> {
    let symbol = match standard {
        StandardId::AnsiBhma => match tier {
            KeyTier::Top => "A".to_string(),
            KeyTier::Master => {
                let mut symbol = String::from("A");
                symbol.push(sibling_letter(sibling_index, "A")?);
                symbol
            }
            KeyTier::SubMaster => {
                let mut symbol = parent_symbol.unwrap_or("AA").to_string();
                symbol.push(sibling_letter(sibling_index, &symbol)?);
                symbol
            }
            KeyTier::Change => {
                format!("{}{}", parent_symbol.unwrap_or("AAA"), sibling_index + 1)
            }
        },
        StandardId::En1303 => match tier {
            KeyTier::Top => "GMK".to_string(),
            KeyTier::Master => format!("MK-{}", sibling_index + 1),
            KeyTier::SubMaster => format!("SK-{}", sibling_index + 1),
            KeyTier::Change => format!("CK-{}", u64::from(sibling_index) * 100 + 1),
        },
    };
    Ok(symbol)
}

/// Numeric part of an EN master symbol (`MK-12` gives `12`), `1` if none.
#[must_use]
pub fn master_number(master_symbol: &str) -> &str {
    let Some(start) = master_symbol.find(|c: char| c.is_ascii_digit()) else {
        return "1";
    };
    let rest = &master_symbol[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Change-key symbol of the `door_index`-th door under a master.
#[must_use]
pub fn generate_change_key_symbol(
    standard: StandardId,
    master_symbol: &str,
    door_index: u32,
) -> String {
    let door_number = u64::from(door_index) + 1;
    match standard {
        StandardId::AnsiBhma => format!("{master_symbol}{door_number}"),
        StandardId::En1303 => {
            format!("CK-{}{door_number:02}", master_number(master_symbol))
        }
    }
}

/// Shared symbol of the `group_index`-th keyed-alike group under a master.
///
/// ANSI reserves decades (`AA10`, `AA20`), EN reserves centuries
/// (`CK-1100`, `CK-1200`), so group symbols stay clear of the dense
/// keyed-differ sequence.
#[must_use]
pub fn generate_ka_symbol(standard: StandardId, master_symbol: &str, group_index: u32) -> String {
    let block = u64::from(group_index) + 1;
    match standard {
        StandardId::AnsiBhma => format!("{master_symbol}{}", block * 10),
        StandardId::En1303 => format!("CK-{}{}", master_number(master_symbol), block * 100),
    }
}

/// Hands out change-key and keyed-alike symbols without collisions.
///
/// Each master owns an independent counter seeded with the number of live
/// assignments (or keyed-alike groups) under it. A candidate that is already
/// in use anywhere in the design is skipped.
#[derive(Debug, Clone)]
pub struct SymbolAllocator {
    standard: StandardId,
    used: HashSet<String>,
    change_counters: HashMap<HierarchyId, u32>,
    ka_counters: HashMap<HierarchyId, u32>,
}

impl SymbolAllocator {
    /// Build an allocator over the current design.
    #[must_use]
    pub fn new(
        standard: StandardId,
        hierarchies: &[HierarchyLevel],
        assignments: &[Assignment],
        ka_groups: &[KaGroup],
    ) -> Self {
        let used = hierarchies
            .iter()
            .map(|h| h.key_symbol.clone())
            .chain(assignments.iter().map(|a| a.key_symbol.clone()))
            .chain(ka_groups.iter().map(|g| g.key_symbol.clone()))
            .collect();

        let mut change_counters = HashMap::new();
        for assignment in assignments {
            *change_counters.entry(assignment.hierarchy_id).or_insert(0) += 1;
        }

        let mut ka_counters = HashMap::new();
        for group in ka_groups {
            *ka_counters.entry(group.master_id).or_insert(0) += 1;
        }

        Self {
            standard,
            used,
            change_counters,
            ka_counters,
        }
    }

    /// Whether a symbol is taken.
    #[must_use]
    pub fn is_used(&self, symbol: &str) -> bool {
        self.used.contains(symbol)
    }

    /// Mark a symbol as taken.
    pub fn reserve(&mut self, symbol: impl Into<String>) {
        self.used.insert(symbol.into());
    }

    /// Next free change-key symbol under a master.
    pub fn next_change_key(&mut self, master: &HierarchyLevel) -> String {
        let standard = self.standard;
        let counter = self.change_counters.entry(master.id).or_insert(0);
        loop {
            let symbol = generate_change_key_symbol(standard, &master.key_symbol, *counter);
            *counter += 1;
            if self.used.insert(symbol.clone()) {
                return symbol;
            }
        }
    }

    /// Next free keyed-alike symbol under a master.
    pub fn next_ka_symbol(&mut self, master: &HierarchyLevel) -> String {
        let standard = self.standard;
        let counter = self.ka_counters.entry(master.id).or_insert(0);
        loop {
            let symbol = generate_ka_symbol(standard, &master.key_symbol, *counter);
            *counter += 1;
            if self.used.insert(symbol.clone()) {
                return symbol;
            }
        }
    }
}
