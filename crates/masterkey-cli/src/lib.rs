//! Command-line front end for the master-key engine.
//!
//! A project lives in one JSON file. Each `mkplan` invocation loads it,
//! runs one command through [`masterkey_engine::MasterKeyService`] and
//! writes it back if the command changed anything.
//!
//! ```text
//! mkplan init --doors doors.json
//! mkplan preview --depth 3
//! mkplan generate --depth 3
//! mkplan plan --apply
//! mkplan validate
//! mkplan export --output keying.json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod app;
pub mod args;
pub mod error;
pub mod render;

pub use app::{run, App, Status};
pub use args::{Cli, Command, HierarchyArgs, KaCommand, OutputFormat};
pub use error::{CliError, Result};
