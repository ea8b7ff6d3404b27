//! Command-line adapter for regionkit.
//!
//! - `parser` / `commands` - clap definitions
//! - `bootstrap` - composition root
//! - `handlers` - command execution
//! - `error` - `CliError` and exit codes

#![deny(unused_crate_dependencies)]

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, DownloadArgs};
pub use error::CliError;
pub use parser::Cli;
