//! Master-key service implementation.
//!
//! This module provides the `MasterKeyEngine` trait and the `MasterKeyService`
//! implementation that applies design mutations to a [`Store`], enforces
//! referential integrity and recomputes capacity after every change.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use masterkey_core::{get_standard, DoorId, HierarchyId, KaGroupId, StandardId, ZoneId};
use masterkey_store::{
    Assignment, CapacitySnapshot, HierarchyLevel, KaGroup, Keying, ProjectConfig, ProjectData,
    Store, Zone,
};

use crate::assignment::{generate_auto_assignment_plan, AssignmentPlan};
use crate::capacity::{assignment_stats, compute_capacity, AssignmentStats, CapacityReport};
use crate::error::{EngineError, Result};
use crate::export::{build_export, ExportSnapshot};
use crate::grouping::derive_groups;
use crate::hierarchy::{
    generate_hierarchy_levels, generate_hierarchy_preview, hierarchy_tree, materialize,
    template_levels, HierarchyNode, HierarchyPreview, LevelDraft,
};
use crate::keyed_alike;
use crate::symbols::SymbolAllocator;
use crate::types::{
    CreateKaGroupRequest, DesignSnapshot, EngineConfig, HierarchyLevelUpdate, HierarchyRequest,
    KaGroupUpdate, NewHierarchyLevel,
};
use crate::validation::{
    validate_design, RuleObserver, TracingObserver, ValidationMode, ValidationReport,
};

/// Display colors cycled through for new zones.
pub const ZONE_PALETTE: [&str; 6] = [
    "#EF4444", "#F59E0B", "#10B981", "#3B82F6", "#8B5CF6", "#EC4899",
];

/// Trait defining the master-key design operations.
///
/// Every mutation validates its input before writing anything and
/// recomputes the stored capacity snapshot afterwards.
pub trait MasterKeyEngine: Send + Sync {
    // =========================================================================
    // Project Operations
    // =========================================================================

    /// Get the project configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn project_config(&self) -> Result<ProjectConfig>;

    /// Switch the keying standard and recompute capacity against its ceiling.
    ///
    /// Existing symbols are kept; run [`MasterKeyEngine::validate`] to see
    /// which no longer fit the new grammar.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn set_standard(&self, standard: StandardId) -> Result<ProjectConfig>;

    // =========================================================================
    // Hierarchy Operations
    // =========================================================================

    /// Show what [`MasterKeyEngine::generate_hierarchy`] would create.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidDepth` for depths outside 1 to 4.
    fn preview_hierarchy(&self, request: &HierarchyRequest) -> Result<HierarchyPreview>;

    /// Replace the hierarchy with a generated one.
    ///
    /// The request's standard, approach and facility type become the project
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::HierarchyInUse` while assignments or keyed-alike
    /// groups exist.
    fn generate_hierarchy(&self, request: &HierarchyRequest) -> Result<Vec<HierarchyLevel>>;

    /// Replace the hierarchy with the facility type's recommended levels.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::HierarchyInUse` while assignments or keyed-alike
    /// groups exist.
    fn apply_hierarchy_template(&self) -> Result<Vec<HierarchyLevel>>;

    /// Add a manually specified level.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty or in use, the key quantity is
    /// zero, or the parent link is invalid (`InvalidParent`).
    fn add_hierarchy_level(&self, level: NewHierarchyLevel) -> Result<HierarchyLevel>;

    /// Change a level's name, description or key quantity.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::HierarchyLevelNotFound` or
    /// `EngineError::InvalidKeyQuantity`.
    fn update_hierarchy_level(
        &self,
        id: &HierarchyId,
        update: HierarchyLevelUpdate,
    ) -> Result<HierarchyLevel>;

    /// Delete a level with no children and no assignments.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::LevelHasChildren` or
    /// `EngineError::LevelHasAssignments` if anything still depends on it.
    fn delete_hierarchy_level(&self, id: &HierarchyId) -> Result<()>;

    /// Nest the hierarchy by parent links.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn hierarchy_tree(&self) -> Result<Vec<HierarchyNode>>;

    // =========================================================================
    // Zone Operations
    // =========================================================================

    /// Create a zone, counting the doors whose zone field matches its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn create_zone(&self, name: &str, color: Option<String>) -> Result<Zone>;

    /// Delete a zone. Doors and assignments are not touched.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ZoneNotFound` for an unknown zone.
    fn delete_zone(&self, id: &ZoneId) -> Result<()>;

    /// Replace every zone with the door groups of the project's approach.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn auto_generate_zones(&self) -> Result<Vec<Zone>>;

    // =========================================================================
    // Assignment Operations
    // =========================================================================

    /// Plan change keys for every unassigned door. Writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn plan_assignments(&self) -> Result<AssignmentPlan>;

    /// Persist a plan as keyed-differ assignments.
    ///
    /// Every entry is checked before any is written.
    ///
    /// # Errors
    ///
    /// Returns an error if a door or master is missing, a door is already
    /// assigned, or a symbol is already in use.
    fn apply_plan(&self, plan: &AssignmentPlan) -> Result<Vec<Assignment>>;

    /// Assign a door under a level with an explicit symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the door or level is missing, the door is already
    /// assigned, or the symbol is empty or in use.
    fn assign_door(
        &self,
        door_id: &DoorId,
        hierarchy_id: &HierarchyId,
        key_symbol: &str,
    ) -> Result<Assignment>;

    /// Assign a door under a level with the level's next free change key.
    ///
    /// # Errors
    ///
    /// Returns an error if the door or level is missing or the door is
    /// already assigned.
    fn assign_next_change_key(
        &self,
        door_id: &DoorId,
        hierarchy_id: &HierarchyId,
    ) -> Result<Assignment>;

    /// Assign several doors under one level with consecutive change keys.
    ///
    /// # Errors
    ///
    /// Returns an error if any door is missing or already assigned; nothing
    /// is written in that case.
    fn bulk_assign(&self, door_ids: &[DoorId], hierarchy_id: &HierarchyId)
        -> Result<Vec<Assignment>>;

    /// Remove a keyed-differ assignment.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAssigned` for an unassigned door and
    /// `EngineError::DoorInKaGroup` for a keyed-alike member.
    fn unassign_door(&self, door_id: &DoorId) -> Result<Assignment>;

    /// Change the physical-key quantity of a keyed-differ door.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidKeyQuantity` for zero,
    /// `EngineError::NotAssigned` or `EngineError::NotKeyedDiffer`.
    fn update_key_quantity(&self, door_id: &DoorId, quantity: u32) -> Result<Assignment>;

    // =========================================================================
    // Keyed-Alike Operations
    // =========================================================================

    /// Create a keyed-alike group.
    ///
    /// # Errors
    ///
    /// See [`keyed_alike::create_ka_group`].
    fn create_ka_group(&self, request: CreateKaGroupRequest) -> Result<KaGroup>;

    /// Rename a group or change its key quantity.
    ///
    /// # Errors
    ///
    /// See [`keyed_alike::update_ka_group`].
    fn update_ka_group(&self, id: &KaGroupId, update: KaGroupUpdate) -> Result<KaGroup>;

    /// Delete a group and unassign its members.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::KaGroupNotFound` for an unknown group.
    fn delete_ka_group(&self, id: &KaGroupId) -> Result<KaGroup>;

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Validate the design against the active standard.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn validate(&self, mode: ValidationMode) -> Result<ValidationReport>;

    /// Current capacity figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn capacity(&self) -> Result<CapacityReport>;

    /// Assignment progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn assignment_stats(&self) -> Result<AssignmentStats>;

    /// Everything an export renderer needs.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn export(&self) -> Result<ExportSnapshot>;
}

/// The master-key service implementation.
pub struct MasterKeyService<S: Store> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: Store> MasterKeyService<S> {
    /// Create a new service.
    #[must_use]
    pub const fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, EngineConfig::default())
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate with a caller-supplied rule observer.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn validate_with(
        &self,
        mode: ValidationMode,
        observer: &dyn RuleObserver,
    ) -> Result<ValidationReport> {
        let data = self.load()?;
        Ok(validate_design(
            &DesignSnapshot::from(&data),
            data.config.standard,
            data.config.facility_type,
            mode,
            observer,
        ))
    }

    /// Recompute and store the capacity snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn recompute_capacity(&self) -> Result<CapacitySnapshot> {
        let data = self.load()?;
        let snapshot = Self::capacity_of(&data);
        self.store.put_capacity(&snapshot)?;

        if snapshot.exceeds_capacity() {
            tracing::warn!(
                differs_used = snapshot.differs_used,
                max_differs = snapshot.max_differs,
                "Design exceeds available differs"
            );
        }

        Ok(snapshot)
    }

    fn capacity_of(data: &ProjectData) -> CapacitySnapshot {
        compute_capacity(
            get_standard(data.config.standard),
            &data.doors,
            &data.hierarchies,
            &data.assignments,
            &data.ka_groups,
        )
    }

    /// Read every record of the project.
    fn load(&self) -> Result<ProjectData> {
        Ok(ProjectData {
            config: self.store.get_config()?,
            doors: self.store.list_doors()?,
            hierarchies: self.store.list_hierarchy_levels()?,
            zones: self.store.list_zones()?,
            assignments: self.store.list_assignments()?,
            ka_groups: self.store.list_ka_groups()?,
            capacity: self.store.get_capacity()?,
        })
    }

    fn get_level(&self, id: &HierarchyId) -> Result<HierarchyLevel> {
        self.store
            .get_hierarchy_level(id)?
            .ok_or(EngineError::HierarchyLevelNotFound(*id))
    }

    /// Fail unless the door exists and holds no assignment.
    fn ensure_assignable(&self, door_id: &DoorId) -> Result<()> {
        if self.store.get_door(door_id)?.is_none() {
            return Err(EngineError::DoorNotFound(door_id.clone()));
        }
        if let Some(existing) = self.store.get_assignment(door_id)? {
            return Err(EngineError::DoorAlreadyAssigned {
                door_id: door_id.clone(),
                key_symbol: existing.key_symbol,
            });
        }
        Ok(())
    }

    fn allocator(&self, data: &ProjectData) -> SymbolAllocator {
        SymbolAllocator::new(
            data.config.standard,
            &data.hierarchies,
            &data.assignments,
            &data.ka_groups,
        )
    }

    /// Swap the whole hierarchy for freshly generated drafts.
    fn replace_hierarchy(&self, drafts: &[LevelDraft]) -> Result<Vec<HierarchyLevel>> {
        let assignments = self.store.list_assignments()?.len();
        let ka_groups = self.store.list_ka_groups()?.len();
        if assignments > 0 || ka_groups > 0 {
            return Err(EngineError::HierarchyInUse {
                assignments,
                ka_groups,
            });
        }

        for level in self.store.list_hierarchy_levels()? {
            self.store.delete_hierarchy_level(&level.id)?;
        }

        let levels = materialize(
            drafts,
            Some(self.config.default_level_key_quantity),
            Utc::now(),
        );
        for level in &levels {
            self.store.put_hierarchy_level(level)?;
        }
        Ok(levels)
    }

    fn count_zone_doors(data: &ProjectData, name: &str) -> u32 {
        let count = data
            .doors
            .iter()
            .filter(|d| d.zone.as_deref().map(str::trim) == Some(name))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

impl<S: Store> MasterKeyEngine for MasterKeyService<S> {
    // =========================================================================
    // Project Operations
    // =========================================================================

    fn project_config(&self) -> Result<ProjectConfig> {
        Ok(self.store.get_config()?)
    }

    fn set_standard(&self, standard: StandardId) -> Result<ProjectConfig> {
        let mut config = self.store.get_config()?;
        config.standard = standard;
        self.store.put_config(&config)?;
        self.recompute_capacity()?;

        tracing::info!(standard = %standard, "Switched keying standard");

        Ok(config)
    }

    // =========================================================================
    // Hierarchy Operations
    // =========================================================================

    fn preview_hierarchy(&self, request: &HierarchyRequest) -> Result<HierarchyPreview> {
        let doors = self.store.list_doors()?;
        generate_hierarchy_preview(request, &doors, &self.config)
    }

    fn generate_hierarchy(&self, request: &HierarchyRequest) -> Result<Vec<HierarchyLevel>> {
        let doors = self.store.list_doors()?;
        let drafts = generate_hierarchy_levels(request, &doors, &self.config)?;
        let levels = self.replace_hierarchy(&drafts)?;

        self.store.put_config(&ProjectConfig::new(
            request.standard,
            request.facility_type,
            request.approach,
        ))?;
        self.recompute_capacity()?;

        tracing::info!(
            standard = %request.standard,
            depth = request.depth,
            approach = %request.approach,
            levels = levels.len(),
            "Generated hierarchy"
        );

        Ok(levels)
    }

    fn apply_hierarchy_template(&self) -> Result<Vec<HierarchyLevel>> {
        let config = self.store.get_config()?;
        let drafts = template_levels(config.standard, config.facility_type)?;
        let levels = self.replace_hierarchy(&drafts)?;
        self.recompute_capacity()?;

        tracing::info!(
            standard = %config.standard,
            facility_type = %config.facility_type,
            levels = levels.len(),
            "Applied hierarchy template"
        );

        Ok(levels)
    }

    fn add_hierarchy_level(&self, new_level: NewHierarchyLevel) -> Result<HierarchyLevel> {
        let key_symbol = new_level.key_symbol.trim().to_string();
        if key_symbol.is_empty() {
            return Err(EngineError::EmptySymbol);
        }
        if let Some(got @ 0) = new_level.key_quantity {
            return Err(EngineError::InvalidKeyQuantity { got });
        }

        let data = self.load()?;
        if self.allocator(&data).is_used(&key_symbol) {
            return Err(EngineError::SymbolInUse(key_symbol));
        }

        let invalid = |reason: &str| EngineError::InvalidParent {
            name: new_level.name.clone(),
            reason: reason.to_string(),
        };
        match (new_level.order, new_level.parent_id) {
            (0, Some(_)) => return Err(invalid("the top level cannot have a parent")),
            (0, None) => {
                if data.hierarchies.iter().any(|h| h.parent_id.is_none()) {
                    return Err(invalid("the hierarchy already has a top level"));
                }
            }
            (_, None) => return Err(invalid("only the top level may omit its parent")),
            (order, Some(parent_id)) => {
                let parent = data
                    .hierarchies
                    .iter()
                    .find(|h| h.id == parent_id)
                    .ok_or(EngineError::HierarchyLevelNotFound(parent_id))?;
                if parent.order + 1 != order {
                    return Err(invalid(&format!(
                        "parent {} is at order {}, expected {}",
                        parent.key_symbol,
                        parent.order,
                        order - 1
                    )));
                }
            }
        }

        let level = HierarchyLevel {
            id: HierarchyId::generate(),
            name: new_level.name,
            level_type: new_level.level_type,
            key_symbol,
            order: new_level.order,
            parent_id: new_level.parent_id,
            description: new_level.description,
            auto_generated: false,
            key_quantity: new_level.key_quantity,
            created_at: Utc::now(),
        };
        self.store.put_hierarchy_level(&level)?;
        self.recompute_capacity()?;

        tracing::info!(
            hierarchy_id = %level.id,
            symbol = %level.key_symbol,
            order = level.order,
            "Created hierarchy level"
        );

        Ok(level)
    }

    fn update_hierarchy_level(
        &self,
        id: &HierarchyId,
        update: HierarchyLevelUpdate,
    ) -> Result<HierarchyLevel> {
        let mut level = self.get_level(id)?;

        if let Some(quantity) = update.key_quantity {
            if quantity == 0 {
                return Err(EngineError::InvalidKeyQuantity { got: quantity });
            }
            level.key_quantity = Some(quantity);
        }
        if let Some(name) = update.name {
            level.name = name;
        }
        if let Some(description) = update.description {
            level.description = description;
        }

        self.store.put_hierarchy_level(&level)?;
        self.recompute_capacity()?;

        tracing::info!(hierarchy_id = %level.id, "Updated hierarchy level");

        Ok(level)
    }

    fn delete_hierarchy_level(&self, id: &HierarchyId) -> Result<()> {
        let level = self.get_level(id)?;

        let children = self
            .store
            .list_hierarchy_levels()?
            .iter()
            .filter(|h| h.parent_id == Some(level.id))
            .count();
        if children > 0 {
            return Err(EngineError::LevelHasChildren {
                hierarchy_id: level.id,
                children,
            });
        }

        let assignments = self
            .store
            .list_assignments()?
            .iter()
            .filter(|a| a.hierarchy_id == level.id)
            .count();
        if assignments > 0 {
            return Err(EngineError::LevelHasAssignments {
                hierarchy_id: level.id,
                assignments,
            });
        }

        self.store.delete_hierarchy_level(id)?;
        self.recompute_capacity()?;

        tracing::info!(
            hierarchy_id = %level.id,
            symbol = %level.key_symbol,
            "Deleted hierarchy level"
        );

        Ok(())
    }

    fn hierarchy_tree(&self) -> Result<Vec<HierarchyNode>> {
        Ok(hierarchy_tree(&self.store.list_hierarchy_levels()?))
    }

    // =========================================================================
    // Zone Operations
    // =========================================================================

    fn create_zone(&self, name: &str, color: Option<String>) -> Result<Zone> {
        let data = self.load()?;
        let name = name.trim();
        let zone = Zone {
            id: ZoneId::generate(),
            name: name.to_string(),
            color: color.unwrap_or_else(|| {
                ZONE_PALETTE[data.zones.len() % ZONE_PALETTE.len()].to_string()
            }),
            door_count: Self::count_zone_doors(&data, name),
            auto_generated: false,
            created_at: Utc::now(),
        };
        self.store.put_zone(&zone)?;

        tracing::info!(zone_id = %zone.id, name = %zone.name, "Created zone");

        Ok(zone)
    }

    fn delete_zone(&self, id: &ZoneId) -> Result<()> {
        if !self.store.list_zones()?.iter().any(|z| z.id == *id) {
            return Err(EngineError::ZoneNotFound(*id));
        }
        self.store.delete_zone(id)?;

        tracing::info!(zone_id = %id, "Deleted zone");

        Ok(())
    }

    fn auto_generate_zones(&self) -> Result<Vec<Zone>> {
        let data = self.load()?;
        for zone in &data.zones {
            self.store.delete_zone(&zone.id)?;
        }

        let now = Utc::now();
        let zones: Vec<Zone> = derive_groups(&data.doors, data.config.approach, &self.config)
            .into_iter()
            .enumerate()
            .map(|(i, (name, doors))| Zone {
                id: ZoneId::generate(),
                name,
                color: ZONE_PALETTE[i % ZONE_PALETTE.len()].to_string(),
                door_count: u32::try_from(doors.len()).unwrap_or(u32::MAX),
                auto_generated: true,
                created_at: now,
            })
            .collect();
        for zone in &zones {
            self.store.put_zone(zone)?;
        }

        tracing::info!(
            approach = %data.config.approach,
            zones = zones.len(),
            "Generated zones"
        );

        Ok(zones)
    }

    // =========================================================================
    // Assignment Operations
    // =========================================================================

    fn plan_assignments(&self) -> Result<AssignmentPlan> {
        let data = self.load()?;
        Ok(generate_auto_assignment_plan(
            &DesignSnapshot::from(&data),
            data.config.standard,
            data.config.approach,
            &self.config,
        ))
    }

    fn apply_plan(&self, plan: &AssignmentPlan) -> Result<Vec<Assignment>> {
        let data = self.load()?;
        let mut allocator = self.allocator(&data);
        let mut planned_doors: HashSet<&DoorId> = HashSet::new();

        for entry in &plan.assignments {
            self.ensure_assignable(&entry.door_id)?;
            if !planned_doors.insert(&entry.door_id) {
                return Err(EngineError::DoorAlreadyAssigned {
                    door_id: entry.door_id.clone(),
                    key_symbol: entry.change_key_symbol.clone(),
                });
            }
            if !data.hierarchies.iter().any(|h| h.id == entry.master.id) {
                return Err(EngineError::HierarchyLevelNotFound(entry.master.id));
            }
            if entry.change_key_symbol.trim().is_empty() {
                return Err(EngineError::EmptySymbol);
            }
            if allocator.is_used(&entry.change_key_symbol) {
                return Err(EngineError::SymbolInUse(entry.change_key_symbol.clone()));
            }
            allocator.reserve(entry.change_key_symbol.clone());
        }

        let quantity = Some(self.config.default_kd_key_quantity);
        let mut created = Vec::with_capacity(plan.assignments.len());
        for entry in &plan.assignments {
            let assignment = Assignment::keyed_differ(
                entry.door_id.clone(),
                entry.master.id,
                entry.change_key_symbol.clone(),
                quantity,
            );
            self.store.put_assignment(&assignment)?;
            created.push(assignment);
        }
        self.recompute_capacity()?;

        tracing::info!(
            assigned = created.len(),
            unassigned = plan.unassigned_doors.len(),
            "Applied assignment plan"
        );

        Ok(created)
    }

    fn assign_door(
        &self,
        door_id: &DoorId,
        hierarchy_id: &HierarchyId,
        key_symbol: &str,
    ) -> Result<Assignment> {
        let key_symbol = key_symbol.trim();
        if key_symbol.is_empty() {
            return Err(EngineError::EmptySymbol);
        }
        self.ensure_assignable(door_id)?;
        let level = self.get_level(hierarchy_id)?;

        let data = self.load()?;
        if self.allocator(&data).is_used(key_symbol) {
            return Err(EngineError::SymbolInUse(key_symbol.to_string()));
        }

        let assignment = Assignment::keyed_differ(
            door_id.clone(),
            level.id,
            key_symbol,
            Some(self.config.default_kd_key_quantity),
        );
        self.store.put_assignment(&assignment)?;
        self.recompute_capacity()?;

        tracing::info!(
            door_id = %door_id,
            master = %level.key_symbol,
            symbol = %assignment.key_symbol,
            "Assigned door"
        );

        Ok(assignment)
    }

    fn assign_next_change_key(
        &self,
        door_id: &DoorId,
        hierarchy_id: &HierarchyId,
    ) -> Result<Assignment> {
        self.bulk_assign(std::slice::from_ref(door_id), hierarchy_id)?
            .pop()
            .ok_or_else(|| EngineError::NotAssigned(door_id.clone()))
    }

    fn bulk_assign(
        &self,
        door_ids: &[DoorId],
        hierarchy_id: &HierarchyId,
    ) -> Result<Vec<Assignment>> {
        let level = self.get_level(hierarchy_id)?;

        let mut unique: Vec<&DoorId> = Vec::with_capacity(door_ids.len());
        for door_id in door_ids {
            if !unique.contains(&door_id) {
                self.ensure_assignable(door_id)?;
                unique.push(door_id);
            }
        }

        let data = self.load()?;
        let mut allocator = self.allocator(&data);
        let quantity = Some(self.config.default_kd_key_quantity);

        let mut created = Vec::with_capacity(unique.len());
        for door_id in unique {
            let assignment = Assignment::keyed_differ(
                door_id.clone(),
                level.id,
                allocator.next_change_key(&level),
                quantity,
            );
            self.store.put_assignment(&assignment)?;
            created.push(assignment);
        }
        self.recompute_capacity()?;

        tracing::info!(
            master = %level.key_symbol,
            assigned = created.len(),
            "Assigned doors"
        );

        Ok(created)
    }

    fn unassign_door(&self, door_id: &DoorId) -> Result<Assignment> {
        let assignment = self
            .store
            .get_assignment(door_id)?
            .ok_or_else(|| EngineError::NotAssigned(door_id.clone()))?;

        if let Some(ka_group_id) = assignment.ka_group_id() {
            return Err(EngineError::DoorInKaGroup {
                door_id: door_id.clone(),
                ka_group_id,
            });
        }

        self.store.delete_assignment(door_id)?;
        self.recompute_capacity()?;

        tracing::info!(
            door_id = %door_id,
            symbol = %assignment.key_symbol,
            "Unassigned door"
        );

        Ok(assignment)
    }

    fn update_key_quantity(&self, door_id: &DoorId, quantity: u32) -> Result<Assignment> {
        if quantity == 0 {
            return Err(EngineError::InvalidKeyQuantity { got: quantity });
        }

        let mut assignment = self
            .store
            .get_assignment(door_id)?
            .ok_or_else(|| EngineError::NotAssigned(door_id.clone()))?;
        let Keying::KeyedDiffer { key_quantity } = &mut assignment.keying else {
            return Err(EngineError::NotKeyedDiffer(door_id.clone()));
        };
        *key_quantity = Some(quantity);

        self.store.put_assignment(&assignment)?;
        self.recompute_capacity()?;

        tracing::info!(door_id = %door_id, quantity, "Updated key quantity");

        Ok(assignment)
    }

    // =========================================================================
    // Keyed-Alike Operations
    // =========================================================================

    fn create_ka_group(&self, request: CreateKaGroupRequest) -> Result<KaGroup> {
        let standard = self.store.get_config()?.standard;
        let group = keyed_alike::create_ka_group(&*self.store, request, standard, &self.config)?;
        self.recompute_capacity()?;
        Ok(group)
    }

    fn update_ka_group(&self, id: &KaGroupId, update: KaGroupUpdate) -> Result<KaGroup> {
        let group = keyed_alike::update_ka_group(&*self.store, id, update)?;
        self.recompute_capacity()?;
        Ok(group)
    }

    fn delete_ka_group(&self, id: &KaGroupId) -> Result<KaGroup> {
        let group = keyed_alike::delete_ka_group(&*self.store, id)?;
        self.recompute_capacity()?;
        Ok(group)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    fn validate(&self, mode: ValidationMode) -> Result<ValidationReport> {
        self.validate_with(mode, &TracingObserver)
    }

    fn capacity(&self) -> Result<CapacityReport> {
        let data = self.load()?;
        Ok(CapacityReport::from(Self::capacity_of(&data)))
    }

    fn assignment_stats(&self) -> Result<AssignmentStats> {
        let data = self.load()?;
        Ok(assignment_stats(
            &data.doors,
            &data.hierarchies,
            &data.assignments,
        ))
    }

    fn export(&self) -> Result<ExportSnapshot> {
        Ok(build_export(&self.load()?, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masterkey_core::{FacilityType, KeyingApproach};
    use masterkey_store::{Door, KeyType, MemoryStore};

    fn setup() -> MasterKeyService<MemoryStore> {
        let store = Arc::new(MemoryStore::new(ProjectConfig::default()));
        for (i, zone) in ["East", "East", "West", "West", "Admin"].iter().enumerate() {
            let door = Door::new(DoorId::new(format!("D{i}")).unwrap()).with_zone(*zone);
            store.put_door(&door).unwrap();
        }
        MasterKeyService::with_defaults(store)
    }

    fn door(id: &str) -> DoorId {
        DoorId::new(id).unwrap()
    }

    fn ansi_request() -> HierarchyRequest {
        HierarchyRequest::new(
            StandardId::AnsiBhma,
            3,
            KeyingApproach::ZoneBased,
            FacilityType::CommercialOffice,
        )
    }

    fn master(service: &MasterKeyService<MemoryStore>, symbol: &str) -> HierarchyLevel {
        service
            .store()
            .list_hierarchy_levels()
            .unwrap()
            .into_iter()
            .find(|h| h.key_symbol == symbol)
            .unwrap()
    }

    #[test]
    fn generate_then_plan_assigns_every_door() {
        let service = setup();
        let levels = service.generate_hierarchy(&ansi_request()).unwrap();
        assert_eq!(levels.len(), 4);

        let plan = service.plan_assignments().unwrap();
        assert!(plan.unassigned_doors.is_empty());
        service.apply_plan(&plan).unwrap();

        let stats = service.assignment_stats().unwrap();
        assert_eq!(stats.progress_percentage, 100);
        assert!(service.validate(ValidationMode::CriticalOnly).unwrap().is_valid());
    }

    #[test]
    fn regenerating_is_blocked_while_assigned() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        let east = master(&service, "AB");
        service.assign_next_change_key(&door("D0"), &east.id).unwrap();

        let err = service.generate_hierarchy(&ansi_request()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::HierarchyInUse {
                assignments: 1,
                ka_groups: 0
            }
        ));
        assert!(matches!(
            service.apply_hierarchy_template(),
            Err(EngineError::HierarchyInUse { .. })
        ));
    }

    #[test]
    fn capacity_is_recomputed_after_mutations() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        assert_eq!(service.store().get_capacity().unwrap().differs_used, 4);

        let admin = master(&service, "AA");
        service
            .bulk_assign(&[door("D4"), door("D4")], &admin.id)
            .unwrap();
        let stored = service.store().get_capacity().unwrap();
        assert_eq!(stored.differs_used, 5);
        assert_eq!(stored.total_physical_keys, 4 * 2 + 2);
        assert_eq!(service.capacity().unwrap().snapshot, stored);
    }

    #[test]
    fn apply_plan_checks_before_writing() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        let plan = service.plan_assignments().unwrap();

        let taken = &plan.assignments[1];
        service
            .assign_door(&taken.door_id, &taken.master.id, "AA99")
            .unwrap();

        let err = service.apply_plan(&plan).unwrap_err();
        assert!(matches!(err, EngineError::DoorAlreadyAssigned { .. }));
        assert_eq!(service.store().list_assignments().unwrap().len(), 1);
    }

    #[test]
    fn assign_door_rejects_symbol_in_use() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        let admin = master(&service, "AA");

        assert!(matches!(
            service.assign_door(&door("D0"), &admin.id, "AB"),
            Err(EngineError::SymbolInUse(_))
        ));
        assert!(matches!(
            service.assign_door(&door("D0"), &admin.id, "  "),
            Err(EngineError::EmptySymbol)
        ));
        assert!(matches!(
            service.assign_door(&door("nope"), &admin.id, "AA1"),
            Err(EngineError::DoorNotFound(_))
        ));
    }

    #[test]
    fn delete_level_guards_children_and_assignments() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        let root = master(&service, "A");
        let west = master(&service, "AC");

        assert!(matches!(
            service.delete_hierarchy_level(&root.id),
            Err(EngineError::LevelHasChildren { children: 3, .. })
        ));

        service.assign_next_change_key(&door("D2"), &west.id).unwrap();
        assert!(matches!(
            service.delete_hierarchy_level(&west.id),
            Err(EngineError::LevelHasAssignments { assignments: 1, .. })
        ));

        service.unassign_door(&door("D2")).unwrap();
        service.delete_hierarchy_level(&west.id).unwrap();
        assert_eq!(service.store().list_hierarchy_levels().unwrap().len(), 3);
    }

    #[test]
    fn add_level_checks_parent_tier() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        let root = master(&service, "A");
        let east = master(&service, "AB");

        let new_level = |order, parent_id, symbol: &str| NewHierarchyLevel {
            name: "East Wing".to_string(),
            level_type: "SMK".to_string(),
            key_symbol: symbol.to_string(),
            order,
            parent_id,
            description: String::new(),
            key_quantity: None,
        };

        assert!(matches!(
            service.add_hierarchy_level(new_level(2, Some(root.id), "ABA")),
            Err(EngineError::InvalidParent { .. })
        ));
        assert!(matches!(
            service.add_hierarchy_level(new_level(0, None, "B")),
            Err(EngineError::InvalidParent { .. })
        ));
        assert!(matches!(
            service.add_hierarchy_level(new_level(2, Some(east.id), "AB")),
            Err(EngineError::SymbolInUse(_))
        ));

        let level = service
            .add_hierarchy_level(new_level(2, Some(east.id), "ABA"))
            .unwrap();
        assert!(!level.auto_generated);
        let tree = service.hierarchy_tree().unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn ka_members_are_released_through_their_group() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        let east = master(&service, "AB");

        let group = service
            .create_ka_group(CreateKaGroupRequest {
                name: "East Stores".to_string(),
                door_ids: vec![door("D0"), door("D1")],
                master_id: east.id,
                key_quantity: Some(8),
            })
            .unwrap();
        let before = service.capacity().unwrap().snapshot.total_physical_keys;

        assert!(matches!(
            service.unassign_door(&door("D0")),
            Err(EngineError::DoorInKaGroup { .. })
        ));
        assert!(matches!(
            service.update_key_quantity(&door("D0"), 3),
            Err(EngineError::NotKeyedDiffer(_))
        ));

        service.delete_ka_group(&group.id).unwrap();
        let after = service.capacity().unwrap().snapshot.total_physical_keys;
        assert_eq!(before - after, 8);
        assert!(service.store().get_assignment(&door("D0")).unwrap().is_none());
    }

    #[test]
    fn key_quantity_updates_only_kd_doors() {
        let service = setup();
        service.generate_hierarchy(&ansi_request()).unwrap();
        let west = master(&service, "AC");
        service.assign_next_change_key(&door("D2"), &west.id).unwrap();

        assert!(matches!(
            service.update_key_quantity(&door("D2"), 0),
            Err(EngineError::InvalidKeyQuantity { got: 0 })
        ));
        let updated = service.update_key_quantity(&door("D2"), 4).unwrap();
        assert_eq!(updated.key_type(), KeyType::KeyedDiffer);
        assert_eq!(updated.key_quantity(), 4);
        assert!(matches!(
            service.update_key_quantity(&door("D3"), 4),
            Err(EngineError::NotAssigned(_))
        ));
    }

    #[test]
    fn zones_are_generated_from_door_groups() {
        let service = setup();
        service.create_zone("Legacy", None).unwrap();

        let zones = service.auto_generate_zones().unwrap();
        let names: Vec<_> = zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["Admin", "East", "West"]);
        assert_eq!(zones[1].door_count, 2);
        assert_eq!(zones[0].color, ZONE_PALETTE[0]);
        assert_eq!(service.store().list_zones().unwrap().len(), 3);

        let manual = service.create_zone("East", Some("#000000".to_string())).unwrap();
        assert_eq!(manual.door_count, 2);
        service.delete_zone(&manual.id).unwrap();
        assert!(matches!(
            service.delete_zone(&manual.id),
            Err(EngineError::ZoneNotFound(_))
        ));
    }

    #[test]
    fn switching_standard_changes_the_ceiling() {
        let service = setup();
        service.set_standard(StandardId::En1303).unwrap();
        assert_eq!(service.capacity().unwrap().snapshot.max_differs, 7776);
        assert_eq!(
            service.project_config().unwrap().standard,
            StandardId::En1303
        );
    }

    #[test]
    fn template_levels_validate_cleanly() {
        let service = setup();
        let levels = service.apply_hierarchy_template().unwrap();
        assert!(!levels.is_empty());
        let report = service.validate(ValidationMode::Full).unwrap();
        assert!(report
            .errors
            .iter()
            .all(|f| f.kind == crate::validation::FindingKind::UnassignedDoors));
    }
}
