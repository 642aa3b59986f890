//! Error types for the command-line front end.

use std::io;
use std::path::PathBuf;

use masterkey_engine::EngineError;
use masterkey_store::StoreError;
use thiserror::Error;

/// A result type using `CliError`.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// `init` would overwrite an existing project.
    #[error("project file already exists: {} (use --force to overwrite)", .0.display())]
    ProjectExists(PathBuf),

    /// No hierarchy level matches the given symbol or id.
    #[error("no hierarchy level with symbol or id {0:?}")]
    UnknownMaster(String),

    /// Engine error, such as a rejected assignment.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Project file could not be loaded or saved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A JSON input file is malformed.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// Output could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
