//! CLI module for the GBADs engine
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP API
//! - tables: Print the table listing
//! - describe: Print one table's columns
//! - query: One-shot query execution

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{describe, query, run, run_command, serve, tables};
pub use config::Config;
pub use errors::{CliError, CliResult};
