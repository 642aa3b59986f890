//! Command dispatch over a project file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use masterkey_core::HierarchyId;
use masterkey_engine::{
    CreateKaGroupRequest, KaGroupUpdate, MasterKeyEngine, MasterKeyService, ValidationMode,
};
use masterkey_store::{Door, HierarchyLevel, MemoryStore, ProjectConfig, Store};
use serde::Serialize;

use crate::args::{Cli, Command, KaCommand, OutputFormat};
use crate::error::{CliError, Result};
use crate::render;

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing to report.
    Success,
    /// Validation found errors.
    Invalid,
}

/// An opened project file and the engine over it.
pub struct App {
    path: PathBuf,
    service: MasterKeyService<MemoryStore>,
}

impl App {
    /// Open an existing project file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = MemoryStore::open(&path)?;
        Ok(Self {
            path,
            service: MasterKeyService::with_defaults(Arc::new(store)),
        })
    }

    /// Start a new project with the given doors. Nothing is written until
    /// [`App::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if a door cannot be stored.
    pub fn create(path: impl Into<PathBuf>, config: ProjectConfig, doors: &[Door]) -> Result<Self> {
        let app = Self {
            path: path.into(),
            service: MasterKeyService::with_defaults(Arc::new(MemoryStore::new(config))),
        };
        app.import_doors(doors)?;
        Ok(app)
    }

    /// The engine.
    #[must_use]
    pub const fn service(&self) -> &MasterKeyService<MemoryStore> {
        &self.service
    }

    /// Project file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the project back to its file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        self.service.store().save(&self.path)?;
        Ok(())
    }

    /// Insert or replace door schedule rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a door cannot be stored.
    pub fn import_doors(&self, doors: &[Door]) -> Result<()> {
        for door in doors {
            self.service.store().put_door(door)?;
        }
        self.service.recompute_capacity()?;
        tracing::info!(count = doors.len(), "Imported doors");
        Ok(())
    }

    /// Find a hierarchy level by key symbol or id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMaster` if nothing matches.
    pub fn resolve_master(&self, reference: &str) -> Result<HierarchyLevel> {
        let levels = self.service.store().list_hierarchy_levels()?;
        let by_id = reference.parse::<HierarchyId>().ok();
        levels
            .into_iter()
            .find(|l| l.key_symbol == reference || Some(l.id) == by_id)
            .ok_or_else(|| CliError::UnknownMaster(reference.to_string()))
    }
}

fn read_doors(path: &Path) -> Result<Vec<Door>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Run a parsed command line, writing results to `out`.
///
/// Mutating commands save the project file on success.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded or saved, or the
/// engine rejects the command.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<Status> {
    tracing::debug!(project = %cli.project.display(), command = ?cli.command, "Running command");

    if let Command::Init {
        standard,
        facility,
        approach,
        doors,
        force,
    } = &cli.command
    {
        if cli.project.exists() && !*force {
            return Err(CliError::ProjectExists(cli.project.clone()));
        }
        let doors = doors.as_deref().map(read_doors).transpose()?.unwrap_or_default();
        let config = ProjectConfig::new(*standard, *facility, *approach);
        let app = App::create(&cli.project, config, &doors)?;
        app.save()?;
        tracing::info!(path = %cli.project.display(), doors = doors.len(), "Created project");
        write_json(out, &app.service.project_config()?)?;
        return Ok(Status::Success);
    }

    let app = App::open(&cli.project)?;
    let status = execute(&app, &cli.command, cli.format, out)?;
    if mutates(&cli.command) {
        app.save()?;
    }
    Ok(status)
}

const fn mutates(command: &Command) -> bool {
    match command {
        Command::Plan { apply } => *apply,
        Command::Init { .. }
        | Command::Preview(_)
        | Command::Tree
        | Command::Validate { .. }
        | Command::Capacity
        | Command::Stats
        | Command::Export { .. } => false,
        Command::Doors { .. }
        | Command::Generate(_)
        | Command::Template
        | Command::Zones
        | Command::Assign { .. }
        | Command::Unassign { .. }
        | Command::Quantity { .. }
        | Command::Ka(_)
        | Command::Standard { .. } => true,
    }
}

#[allow(clippy::too_many_lines)]
fn execute(
    app: &App,
    command: &Command,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<Status> {
    let service = app.service();
    let text = format == OutputFormat::Text;

    match command {
        Command::Init { .. } => {}
        Command::Doors { file } => {
            let doors = read_doors(file)?;
            app.import_doors(&doors)?;
            write_json(out, &service.assignment_stats()?)?;
        }
        Command::Preview(args) => {
            let request = args.request(&service.project_config()?);
            let preview = service.preview_hierarchy(&request)?;
            if text {
                render::preview(out, &preview)?;
            } else {
                write_json(out, &preview)?;
            }
        }
        Command::Generate(args) => {
            let request = args.request(&service.project_config()?);
            service.generate_hierarchy(&request)?;
            print_tree(service, text, out)?;
        }
        Command::Template => {
            service.apply_hierarchy_template()?;
            print_tree(service, text, out)?;
        }
        Command::Tree => print_tree(service, text, out)?,
        Command::Zones => write_json(out, &service.auto_generate_zones()?)?,
        Command::Plan { apply } => {
            let plan = service.plan_assignments()?;
            if *apply {
                let written = service.apply_plan(&plan)?;
                tracing::info!(count = written.len(), "Applied assignment plan");
            }
            if text {
                render::plan(out, &plan)?;
            } else {
                write_json(out, &plan)?;
            }
        }
        Command::Assign {
            door,
            master,
            symbol,
        } => {
            let level = app.resolve_master(master)?;
            let assignment = match symbol {
                Some(symbol) => service.assign_door(door, &level.id, symbol)?,
                None => service.assign_next_change_key(door, &level.id)?,
            };
            write_json(out, &assignment)?;
        }
        Command::Unassign { door } => write_json(out, &service.unassign_door(door)?)?,
        Command::Quantity { door, quantity } => {
            write_json(out, &service.update_key_quantity(door, *quantity)?)?;
        }
        Command::Ka(ka) => run_ka(app, ka, out)?,
        Command::Standard { standard } => write_json(out, &service.set_standard(*standard)?)?,
        Command::Validate { critical } => {
            let mode = if *critical {
                ValidationMode::CriticalOnly
            } else {
                ValidationMode::Full
            };
            let report = service.validate(mode)?;
            if text {
                render::report(out, &report)?;
            } else {
                write_json(out, &report)?;
            }
            if !report.is_valid() {
                return Ok(Status::Invalid);
            }
        }
        Command::Capacity => {
            let capacity = service.capacity()?;
            if text {
                render::capacity(out, &capacity)?;
            } else {
                write_json(out, &capacity)?;
            }
        }
        Command::Stats => write_json(out, &service.assignment_stats()?)?,
        Command::Export { output } => {
            let snapshot = service.export()?;
            match output {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&snapshot)?;
                    fs::write(path, json)?;
                    tracing::info!(path = %path.display(), "Wrote export");
                }
                None => write_json(out, &snapshot)?,
            }
        }
    }
    Ok(Status::Success)
}

fn run_ka(app: &App, command: &KaCommand, out: &mut dyn Write) -> Result<()> {
    let service = app.service();
    let group = match command {
        KaCommand::Create {
            name,
            master,
            doors,
            quantity,
        } => {
            let level = app.resolve_master(master)?;
            service.create_ka_group(CreateKaGroupRequest {
                name: name.clone(),
                door_ids: doors.clone(),
                master_id: level.id,
                key_quantity: *quantity,
            })?
        }
        KaCommand::Update { id, name, quantity } => service.update_ka_group(
            id,
            KaGroupUpdate {
                name: name.clone(),
                key_quantity: *quantity,
            },
        )?,
        KaCommand::Delete { id } => service.delete_ka_group(id)?,
    };
    write_json(out, &group)
}

fn print_tree(
    service: &MasterKeyService<MemoryStore>,
    text: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let tree = service.hierarchy_tree()?;
    if text {
        render::tree(out, &tree)?;
    } else {
        write_json(out, &tree)?;
    }
    Ok(())
}
