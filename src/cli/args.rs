//! CLI argument definitions using clap
//!
//! Commands:
//! - gbads serve --config <path>
//! - gbads tables --config <path>
//! - gbads describe <table> --config <path>
//! - gbads query <table> --config <path> [--fields ..] [--filter ..] [--join ..]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GBADs public query engine
#[derive(Parser, Debug)]
#[command(name = "gbads")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./gbads.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the warehouse tables
    Tables {
        /// Path to configuration file
        #[arg(long, default_value = "./gbads.json")]
        config: PathBuf,

        /// Output format (json, html, text, csv, file)
        #[arg(long)]
        format: Option<String>,
    },

    /// Describe one table's columns
    Describe {
        /// Table name
        table: String,

        /// Path to configuration file
        #[arg(long, default_value = "./gbads.json")]
        config: PathBuf,

        #[arg(long)]
        format: Option<String>,
    },

    /// Run one query and print the rendered result
    Query {
        /// Primary table
        table: String,

        /// Path to configuration file
        #[arg(long, default_value = "./gbads.json")]
        config: PathBuf,

        /// Comma-separated columns, or * for all
        #[arg(long)]
        fields: Option<String>,

        /// Filter expression, e.g. "year=2017 AND country='Ethiopia'"
        #[arg(long)]
        filter: Option<String>,

        /// Joins as table1,table2,field1,field2 separated by ';'
        #[arg(long)]
        join: Option<String>,

        /// Ordering, e.g. "year desc,country"
        #[arg(long)]
        order: Option<String>,

        #[arg(long)]
        format: Option<String>,

        /// Return only the number of matching rows
        #[arg(long)]
        count: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
