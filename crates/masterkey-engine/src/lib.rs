//! Master-key hierarchy and assignment engine.
//!
//! This crate holds the keying logic of a master-key design: symbol
//! grammars, hierarchy generation, door grouping, auto-assignment planning,
//! keyed-alike groups, capacity accounting and standards validation. The
//! [`MasterKeyService`] applies changes to a [`masterkey_store::Store`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    mkplan (CLI) / UI                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MasterKeyService                        │
//! │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌────────────┐   │
//! │  │ Hierarchy │ │ Assignment│ │   Keyed   │ │ Validation │   │
//! │  │ generator │ │  planner  │ │   alike   │ │ & capacity │   │
//! │  └───────────┘ └───────────┘ └───────────┘ └────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                       ┌─────────────┐
//!                       │    Store    │
//!                       │ (in-memory, │
//!                       │  JSON file) │
//!                       └─────────────┘
//! ```
//!
//! Planning and preview functions are pure over their inputs. Only the
//! service writes.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use masterkey_engine::{HierarchyRequest, MasterKeyEngine, MasterKeyService};
//! use masterkey_core::{DoorId, FacilityType, KeyingApproach, StandardId};
//! use masterkey_store::{Door, MemoryStore, ProjectConfig, Store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new(ProjectConfig::default()));
//! store.put_door(&Door::new(DoorId::new("101")?).with_zone("East"))?;
//! store.put_door(&Door::new(DoorId::new("102")?).with_zone("West"))?;
//!
//! let service = MasterKeyService::with_defaults(store);
//! let request = HierarchyRequest::new(
//!     StandardId::AnsiBhma,
//!     3,
//!     KeyingApproach::ZoneBased,
//!     FacilityType::CommercialOffice,
//! );
//! service.generate_hierarchy(&request)?;
//!
//! let plan = service.plan_assignments()?;
//! service.apply_plan(&plan)?;
//! assert_eq!(service.assignment_stats()?.unassigned_doors, 0);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assignment;
pub mod capacity;
pub mod error;
pub mod export;
pub mod grouping;
pub mod hierarchy;
pub mod keyed_alike;
pub mod service;
pub mod symbols;
pub mod types;
pub mod validation;

pub use assignment::{
    generate_auto_assignment_plan, match_group_to_master, AssignmentPlan, MasterCount, MasterRef,
    PlannedAssignment,
};
pub use capacity::{
    assignment_stats, compute_capacity, differs_used, AssignmentStats, CapacityReport, MasterStats,
};
pub use error::{EngineError, Result};
pub use export::{build_export, CuttingListEntry, ExportSnapshot, ScheduleRow, StandardSummary};
pub use grouping::{derive_groups, UNASSIGNED_GROUP};
pub use hierarchy::{
    estimate_master_count, generate_hierarchy_levels, generate_hierarchy_preview, hierarchy_tree,
    HierarchyNode, HierarchyPreview, LevelDraft,
};
pub use service::{MasterKeyEngine, MasterKeyService};
pub use symbols::{
    generate_change_key_symbol, generate_ka_symbol, generate_key_symbol, KeyTier,
    SymbolAllocator,
};
pub use types::{
    CreateKaGroupRequest, DesignSnapshot, EngineConfig, HierarchyLevelUpdate, HierarchyRequest,
    KaGroupUpdate, NewHierarchyLevel,
};
pub use validation::{
    validate_design, validate_standards_compliance, Finding, FindingKind, RuleObserver, Severity,
    TracingObserver, ValidationMode, ValidationReport,
};
