//! Storage layer for masterkey projects.
//!
//! This crate defines the records a master-key design is made of and the
//! [`Store`] trait the engine reads and writes them through.
//!
//! # Architecture
//!
//! A project holds the following collections, each kept in insertion order:
//!
//! - `doors`: rows of the external door schedule, keyed by `door_id`
//! - `hierarchies`: hierarchy levels, keyed by `hierarchy_id`
//! - `zones`: descriptive door groupings, keyed by `zone_id`
//! - `assignments`: at most one per door, keyed by `door_id`
//! - `ka_groups`: keyed-alike groups, keyed by `ka_group_id`
//!
//! plus the project configuration and the last computed capacity snapshot.
//!
//! # Example
//!
//! ```
//! use masterkey_store::{MemoryStore, ProjectConfig, Store};
//!
//! let store = MemoryStore::new(ProjectConfig::default());
//! assert!(store.list_hierarchy_levels().unwrap().is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use types::{
    Assignment, CapacitySnapshot, CapacityStatus, Door, HierarchyLevel, KaGroup, KeyType, Keying,
    ProjectConfig, ProjectData, Zone, DEFAULT_KEY_QUANTITY,
};

use masterkey_core::{DoorId, HierarchyId, KaGroupId, ZoneId};

/// The storage trait defining all project operations.
///
/// This trait abstracts the storage layer so the engine can run against an
/// in-memory project, a project file, or a document database.
pub trait Store: Send + Sync {
    // =========================================================================
    // Project Operations
    // =========================================================================

    /// Get the project configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_config(&self) -> Result<ProjectConfig>;

    /// Replace the project configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_config(&self, config: &ProjectConfig) -> Result<()>;

    /// Get the last stored capacity snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_capacity(&self) -> Result<CapacitySnapshot>;

    /// Replace the capacity snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_capacity(&self, capacity: &CapacitySnapshot) -> Result<()>;

    // =========================================================================
    // Door Operations
    // =========================================================================

    /// Insert or update a door row.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_door(&self, door: &Door) -> Result<()>;

    /// Get a door by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_door(&self, door_id: &DoorId) -> Result<Option<Door>>;

    /// List all doors in schedule order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_doors(&self) -> Result<Vec<Door>>;

    // =========================================================================
    // Hierarchy Operations
    // =========================================================================

    /// Insert or update a hierarchy level.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_hierarchy_level(&self, level: &HierarchyLevel) -> Result<()>;

    /// Get a hierarchy level by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_hierarchy_level(&self, id: &HierarchyId) -> Result<Option<HierarchyLevel>>;

    /// Delete a hierarchy level.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the level doesn't exist.
    fn delete_hierarchy_level(&self, id: &HierarchyId) -> Result<()>;

    /// List hierarchy levels in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_hierarchy_levels(&self) -> Result<Vec<HierarchyLevel>>;

    // =========================================================================
    // Zone Operations
    // =========================================================================

    /// Insert or update a zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_zone(&self, zone: &Zone) -> Result<()>;

    /// Delete a zone.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the zone doesn't exist.
    fn delete_zone(&self, id: &ZoneId) -> Result<()>;

    /// List zones in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_zones(&self) -> Result<Vec<Zone>>;

    // =========================================================================
    // Assignment Operations
    // =========================================================================

    /// Insert or replace the assignment of a door.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_assignment(&self, assignment: &Assignment) -> Result<()>;

    /// Get the assignment of a door.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_assignment(&self, door_id: &DoorId) -> Result<Option<Assignment>>;

    /// Delete the assignment of a door.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the door has no assignment.
    fn delete_assignment(&self, door_id: &DoorId) -> Result<()>;

    /// List assignments in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_assignments(&self) -> Result<Vec<Assignment>>;

    // =========================================================================
    // Keyed-Alike Group Operations
    // =========================================================================

    /// Insert or update a keyed-alike group.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_ka_group(&self, group: &KaGroup) -> Result<()>;

    /// Get a keyed-alike group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_ka_group(&self, id: &KaGroupId) -> Result<Option<KaGroup>>;

    /// Delete a keyed-alike group.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the group doesn't exist.
    fn delete_ka_group(&self, id: &KaGroupId) -> Result<()>;

    /// List keyed-alike groups in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_ka_groups(&self) -> Result<Vec<KaGroup>>;
}
