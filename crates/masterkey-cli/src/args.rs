//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use masterkey_core::{DoorId, FacilityType, KaGroupId, KeyingApproach, StandardId};
use masterkey_engine::HierarchyRequest;
use masterkey_store::ProjectConfig;

/// mkplan - plan master-key hierarchies and door assignments.
#[derive(Parser, Debug)]
#[command(name = "mkplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project file.
    #[arg(
        long,
        global = true,
        env = "MKPLAN_PROJECT",
        default_value = "mkplan.json"
    )]
    pub project: PathBuf,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable debug logging.
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// Human-readable summary.
    Text,
}

/// Hierarchy shape; unset fields come from the project configuration.
#[derive(Args, Debug, Clone)]
pub struct HierarchyArgs {
    /// Tiers including change keys, 1 to 4.
    #[arg(long, default_value_t = 3)]
    pub depth: u32,

    /// Door grouping approach.
    #[arg(long)]
    pub approach: Option<KeyingApproach>,

    /// Keying standard.
    #[arg(long)]
    pub standard: Option<StandardId>,

    /// Facility type.
    #[arg(long)]
    pub facility: Option<FacilityType>,
}

impl HierarchyArgs {
    /// Build a request, filling gaps from the project.
    #[must_use]
    pub fn request(&self, config: &ProjectConfig) -> HierarchyRequest {
        HierarchyRequest::new(
            self.standard.unwrap_or(config.standard),
            self.depth,
            self.approach.unwrap_or(config.approach),
            self.facility.unwrap_or(config.facility_type),
        )
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project file.
    Init {
        /// Keying standard.
        #[arg(long, default_value = "ANSI_BHMA")]
        standard: StandardId,
        /// Facility type.
        #[arg(long, default_value = "commercial_office")]
        facility: FacilityType,
        /// Door grouping approach.
        #[arg(long, default_value = "zone_based")]
        approach: KeyingApproach,
        /// Door schedule to import (JSON array of doors).
        #[arg(long)]
        doors: Option<PathBuf>,
        /// Overwrite an existing project file.
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Import or update door schedule rows.
    Doors {
        /// JSON array of doors.
        file: PathBuf,
    },

    /// Show what `generate` would create.
    Preview(HierarchyArgs),

    /// Replace the hierarchy with a generated one.
    Generate(HierarchyArgs),

    /// Replace the hierarchy with the facility type's recommended levels.
    Template,

    /// Print the hierarchy as a tree.
    Tree,

    /// Regenerate zones from door groups.
    Zones,

    /// Plan change keys for unassigned doors.
    Plan {
        /// Persist the plan.
        #[arg(long, default_value = "false")]
        apply: bool,
    },

    /// Assign a door under a master.
    Assign {
        /// Door id.
        door: DoorId,
        /// Master symbol or level id.
        #[arg(long)]
        master: String,
        /// Explicit change-key symbol; the next free one if omitted.
        #[arg(long)]
        symbol: Option<String>,
    },

    /// Remove a keyed-differ assignment.
    Unassign {
        /// Door id.
        door: DoorId,
    },

    /// Set the key quantity of a keyed-differ door.
    Quantity {
        /// Door id.
        door: DoorId,
        /// Physical keys to cut.
        quantity: u32,
    },

    /// Manage keyed-alike groups.
    #[command(subcommand)]
    Ka(KaCommand),

    /// Switch the keying standard.
    Standard {
        /// New standard.
        standard: StandardId,
    },

    /// Validate the design.
    Validate {
        /// Report structural and completeness findings only.
        #[arg(long, default_value = "false")]
        critical: bool,
    },

    /// Show differs and key totals.
    Capacity,

    /// Show assignment progress.
    Stats,

    /// Write the export snapshot.
    Export {
        /// Output file; stdout if omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Keyed-alike group commands.
#[derive(Subcommand, Debug)]
pub enum KaCommand {
    /// Create a group.
    Create {
        /// Group name.
        #[arg(long)]
        name: String,
        /// Master symbol or level id.
        #[arg(long)]
        master: String,
        /// Member door; repeat for each door.
        #[arg(long = "door", required = true)]
        doors: Vec<DoorId>,
        /// Physical keys for the group.
        #[arg(long)]
        quantity: Option<u32>,
    },

    /// Rename a group or change its key quantity.
    Update {
        /// Group id.
        id: KaGroupId,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New key quantity.
        #[arg(long)]
        quantity: Option<u32>,
    },

    /// Delete a group and unassign its doors.
    Delete {
        /// Group id.
        id: KaGroupId,
    },
}
