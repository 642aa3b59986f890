//! In-memory storage implementation.
//!
//! This module provides the `MemoryStore` implementation of the `Store`
//! trait. A store can be loaded from and saved to a JSON project file.

use std::fs;
use std::path::Path;

use masterkey_core::{DoorId, HierarchyId, KaGroupId, ZoneId};
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::types::{
    Assignment, CapacitySnapshot, Door, HierarchyLevel, KaGroup, ProjectConfig, ProjectData, Zone,
};
use crate::Store;

/// Project storage held in memory behind a read-write lock.
pub struct MemoryStore {
    data: RwLock<ProjectData>,
}

impl MemoryStore {
    /// Create an empty project with the given configuration.
    #[must_use]
    pub fn new(config: ProjectConfig) -> Self {
        Self::from_data(ProjectData {
            config,
            ..ProjectData::default()
        })
    }

    /// Wrap existing project data.
    #[must_use]
    pub fn from_data(data: ProjectData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Load a project from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid project.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let data: ProjectData =
            serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?;
        tracing::debug!(
            path = %path.as_ref().display(),
            doors = data.doors.len(),
            hierarchies = data.hierarchies.len(),
            assignments = data.assignments.len(),
            "Loaded project file"
        );
        Ok(Self::from_data(data))
    }

    /// Write the project to a JSON file, replacing its contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be serialized or written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.data.read())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(path.as_ref(), json)?;
        tracing::debug!(path = %path.as_ref().display(), "Saved project file");
        Ok(())
    }

    /// Clone every record of the project.
    #[must_use]
    pub fn snapshot(&self) -> ProjectData {
        self.data.read().clone()
    }
}

/// Replace the element with a matching key, or append it.
fn upsert<T: Clone, K: PartialEq>(items: &mut Vec<T>, item: &T, key: impl Fn(&T) -> K) {
    let wanted = key(item);
    match items.iter_mut().find(|existing| key(existing) == wanted) {
        Some(slot) => *slot = item.clone(),
        None => items.push(item.clone()),
    }
}

/// Remove the element with a matching key.
fn remove<T, K: PartialEq>(
    items: &mut Vec<T>,
    wanted: &K,
    key: impl Fn(&T) -> K,
    kind: &'static str,
    id: &dyn ToString,
) -> Result<()> {
    let before = items.len();
    items.retain(|item| &key(item) != wanted);
    if items.len() == before {
        return Err(StoreError::not_found(kind, id.to_string()));
    }
    Ok(())
}

impl Store for MemoryStore {
    // =========================================================================
    // Project Operations
    // =========================================================================

    fn get_config(&self) -> Result<ProjectConfig> {
        Ok(self.data.read().config)
    }

    fn put_config(&self, config: &ProjectConfig) -> Result<()> {
        self.data.write().config = *config;
        Ok(())
    }

    fn get_capacity(&self) -> Result<CapacitySnapshot> {
        Ok(self.data.read().capacity)
    }

    fn put_capacity(&self, capacity: &CapacitySnapshot) -> Result<()> {
        self.data.write().capacity = *capacity;
        Ok(())
    }

    // =========================================================================
    // Door Operations
    // =========================================================================

    fn put_door(&self, door: &Door) -> Result<()> {
        upsert(&mut self.data.write().doors, door, |d| d.id.clone());
        Ok(())
    }

    fn get_door(&self, door_id: &DoorId) -> Result<Option<Door>> {
        Ok(self
            .data
            .read()
            .doors
            .iter()
            .find(|d| &d.id == door_id)
            .cloned())
    }

    fn list_doors(&self) -> Result<Vec<Door>> {
        Ok(self.data.read().doors.clone())
    }

    // =========================================================================
    // Hierarchy Operations
    // =========================================================================

    fn put_hierarchy_level(&self, level: &HierarchyLevel) -> Result<()> {
        upsert(&mut self.data.write().hierarchies, level, |h| h.id);
        Ok(())
    }

    fn get_hierarchy_level(&self, id: &HierarchyId) -> Result<Option<HierarchyLevel>> {
        Ok(self
            .data
            .read()
            .hierarchies
            .iter()
            .find(|h| &h.id == id)
            .cloned())
    }

    fn delete_hierarchy_level(&self, id: &HierarchyId) -> Result<()> {
        remove(
            &mut self.data.write().hierarchies,
            id,
            |h| h.id,
            "hierarchy level",
            id,
        )
    }

    fn list_hierarchy_levels(&self) -> Result<Vec<HierarchyLevel>> {
        Ok(self.data.read().hierarchies.clone())
    }

    // =========================================================================
    // Zone Operations
    // =========================================================================

    fn put_zone(&self, zone: &Zone) -> Result<()> {
        upsert(&mut self.data.write().zones, zone, |z| z.id);
        Ok(())
    }

    fn delete_zone(&self, id: &ZoneId) -> Result<()> {
        remove(&mut self.data.write().zones, id, |z| z.id, "zone", id)
    }

    fn list_zones(&self) -> Result<Vec<Zone>> {
        Ok(self.data.read().zones.clone())
    }

    // =========================================================================
    // Assignment Operations
    // =========================================================================

    fn put_assignment(&self, assignment: &Assignment) -> Result<()> {
        upsert(&mut self.data.write().assignments, assignment, |a| {
            a.door_id.clone()
        });
        Ok(())
    }

    fn get_assignment(&self, door_id: &DoorId) -> Result<Option<Assignment>> {
        Ok(self
            .data
            .read()
            .assignments
            .iter()
            .find(|a| &a.door_id == door_id)
            .cloned())
    }

    fn delete_assignment(&self, door_id: &DoorId) -> Result<()> {
        remove(
            &mut self.data.write().assignments,
            door_id,
            |a| a.door_id.clone(),
            "assignment",
            door_id,
        )
    }

    fn list_assignments(&self) -> Result<Vec<Assignment>> {
        Ok(self.data.read().assignments.clone())
    }

    // =========================================================================
    // Keyed-Alike Group Operations
    // =========================================================================

    fn put_ka_group(&self, group: &KaGroup) -> Result<()> {
        upsert(&mut self.data.write().ka_groups, group, |g| g.id);
        Ok(())
    }

    fn get_ka_group(&self, id: &KaGroupId) -> Result<Option<KaGroup>> {
        Ok(self
            .data
            .read()
            .ka_groups
            .iter()
            .find(|g| &g.id == id)
            .cloned())
    }

    fn delete_ka_group(&self, id: &KaGroupId) -> Result<()> {
        remove(
            &mut self.data.write().ka_groups,
            id,
            |g| g.id,
            "keyed-alike group",
            id,
        )
    }

    fn list_ka_groups(&self) -> Result<Vec<KaGroup>> {
        Ok(self.data.read().ka_groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use masterkey_core::{FacilityType, KeyingApproach, StandardId};

    fn level(name: &str, symbol: &str, order: u32) -> HierarchyLevel {
        HierarchyLevel {
            id: HierarchyId::generate(),
            name: name.to_string(),
            level_type: "MK".to_string(),
            key_symbol: symbol.to_string(),
            order,
            parent_id: None,
            description: String::new(),
            auto_generated: false,
            key_quantity: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn put_preserves_insertion_order_and_replaces_in_place() {
        let store = MemoryStore::new(ProjectConfig::default());
        let a = level("A", "AA", 1);
        let mut b = level("B", "AB", 1);
        store.put_hierarchy_level(&a).unwrap();
        store.put_hierarchy_level(&b).unwrap();

        b.name = "B renamed".to_string();
        store.put_hierarchy_level(&b).unwrap();

        let names: Vec<_> = store
            .list_hierarchy_levels()
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["A", "B renamed"]);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = MemoryStore::new(ProjectConfig::default());
        let result = store.delete_zone(&ZoneId::generate());
        assert!(matches!(
            result,
            Err(StoreError::NotFound { kind: "zone", .. })
        ));
    }

    #[test]
    fn one_assignment_per_door() {
        let store = MemoryStore::new(ProjectConfig::default());
        let door = DoorId::new("D1").unwrap();
        let master = HierarchyId::generate();
        store
            .put_assignment(&Assignment::keyed_differ(door.clone(), master, "AA1", None))
            .unwrap();
        store
            .put_assignment(&Assignment::keyed_differ(door.clone(), master, "AA2", None))
            .unwrap();

        let all = store.list_assignments().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(store.get_assignment(&door).unwrap().unwrap().key_symbol, "AA2");
    }

    #[test]
    fn save_and_open_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");

        let config = ProjectConfig::new(
            StandardId::En1303,
            FacilityType::Healthcare,
            KeyingApproach::FloorBased,
        );
        let store = MemoryStore::new(config);
        store
            .put_door(&Door::new(DoorId::new("D1").unwrap()).with_level("2"))
            .unwrap();
        store.put_hierarchy_level(&level("GM", "GM", 0)).unwrap();
        store.save(&path).unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.get_config().unwrap(), config);
        assert_eq!(reopened.snapshot(), store.snapshot());
    }

    #[test]
    fn open_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MemoryStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
