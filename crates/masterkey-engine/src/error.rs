//! Error types for the engine.
//!
//! Every input-validation failure is rejected before anything is written and
//! carries enough detail for a user-facing message. Compliance findings are
//! not errors; see [`crate::validation`].

use masterkey_core::{DoorId, HierarchyId, KaGroupId, ZoneId};
use thiserror::Error;

/// A result type using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested door is not in the schedule.
    #[error("door not found: {0}")]
    DoorNotFound(DoorId),

    /// The requested hierarchy level was not found.
    #[error("hierarchy level not found: {0}")]
    HierarchyLevelNotFound(HierarchyId),

    /// The requested zone was not found.
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// The requested keyed-alike group was not found.
    #[error("keyed-alike group not found: {0}")]
    KaGroupNotFound(KaGroupId),

    /// The door has no assignment.
    #[error("door {0} is not assigned")]
    NotAssigned(DoorId),

    /// A keyed-alike group needs at least two distinct doors.
    #[error("keyed-alike group needs at least 2 doors, got {got}")]
    KaGroupTooSmall {
        /// Number of distinct doors supplied.
        got: usize,
    },

    /// Key quantities must be at least one.
    #[error("key quantity must be at least 1, got {got}")]
    InvalidKeyQuantity {
        /// The rejected quantity.
        got: u32,
    },

    /// The level still has child levels.
    #[error("cannot delete hierarchy level {hierarchy_id}: it has {children} child level(s)")]
    LevelHasChildren {
        /// The level being deleted.
        hierarchy_id: HierarchyId,
        /// Number of children.
        children: usize,
    },

    /// Doors are still assigned under the level.
    #[error(
        "cannot delete hierarchy level {hierarchy_id}: {assignments} door(s) are assigned under it"
    )]
    LevelHasAssignments {
        /// The level being deleted.
        hierarchy_id: HierarchyId,
        /// Number of live assignments.
        assignments: usize,
    },

    /// The hierarchy cannot be replaced while doors are assigned or grouped.
    #[error(
        "cannot replace the hierarchy: {assignments} assignment(s) and {ka_groups} keyed-alike group(s) depend on it"
    )]
    HierarchyInUse {
        /// Number of live assignments.
        assignments: usize,
        /// Number of keyed-alike groups.
        ka_groups: usize,
    },

    /// The door already holds an assignment.
    #[error("door {door_id} is already assigned to {key_symbol}")]
    DoorAlreadyAssigned {
        /// The door.
        door_id: DoorId,
        /// Its current change-key symbol.
        key_symbol: String,
    },

    /// The symbol is already used by another key.
    #[error("key symbol {0:?} is already in use")]
    SymbolInUse(String),

    /// The symbol is empty.
    #[error("key symbol must not be empty")]
    EmptySymbol,

    /// Only keyed-differ doors carry their own key quantity.
    #[error("door {0} is keyed alike; change the quantity on its group")]
    NotKeyedDiffer(DoorId),

    /// Keyed-alike members are released by deleting their group.
    #[error("door {door_id} belongs to keyed-alike group {ka_group_id}; delete the group instead")]
    DoorInKaGroup {
        /// The door.
        door_id: DoorId,
        /// Its group.
        ka_group_id: KaGroupId,
    },

    /// No letters are left for another sibling under the parent symbol.
    #[error("symbol space exhausted under {parent:?}: sibling index {index} has no letter")]
    SymbolSpaceExhausted {
        /// The parent symbol.
        parent: String,
        /// The sibling index that overflowed.
        index: u32,
    },

    /// Hierarchy generation supports depths 1 to 4.
    #[error("hierarchy depth must be between 1 and 4, got {depth}")]
    InvalidDepth {
        /// The rejected depth.
        depth: u32,
    },

    /// The level's parent does not sit exactly one tier above it.
    #[error("invalid parent for level {name:?}: {reason}")]
    InvalidParent {
        /// Name of the level being written.
        name: String,
        /// What is wrong with the parent link.
        reason: String,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] masterkey_store::StoreError),

    /// Core error, such as an unknown standard.
    #[error(transparent)]
    Core(#[from] masterkey_core::CoreError),
}

impl EngineError {
    /// Returns true if the error was caused by the caller's input rather than
    /// the storage layer.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// Returns true if a referenced record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DoorNotFound(_)
                | Self::HierarchyLevelNotFound(_)
                | Self::ZoneNotFound(_)
                | Self::KaGroupNotFound(_)
                | Self::NotAssigned(_)
                | Self::Store(masterkey_store::StoreError::NotFound { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_classified() {
        assert!(EngineError::KaGroupTooSmall { got: 1 }.is_validation());
        assert!(EngineError::InvalidKeyQuantity { got: 0 }.is_validation());
        assert!(EngineError::Core(masterkey_core::CoreError::UnknownStandard("X".into()))
            .is_validation());

        let io = masterkey_store::StoreError::Serialization("bad".into());
        assert!(!EngineError::Store(io).is_validation());
    }

    #[test]
    fn not_found_errors_are_classified() {
        let door = DoorId::new("D1").unwrap();
        assert!(EngineError::DoorNotFound(door.clone()).is_not_found());
        assert!(EngineError::NotAssigned(door).is_not_found());
        assert!(!EngineError::SymbolInUse("AA1".into()).is_not_found());
    }

    #[test]
    fn messages_name_the_payload() {
        let err = EngineError::KaGroupTooSmall { got: 1 };
        assert_eq!(
            err.to_string(),
            "keyed-alike group needs at least 2 doors, got 1"
        );

        let err = EngineError::SymbolSpaceExhausted {
            parent: "A".into(),
            index: 26,
        };
        assert!(err.to_string().contains("26"));
    }
}
