//! CLI command implementations
//!
//! Each command loads the configuration, sets the log level, introspects
//! the warehouse and then either serves or runs one request and prints the
//! rendered body to stdout.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::http_server::HttpServer;
use crate::moderation::{LocalObjectStore, ModerationService};
use crate::observability::Logger;
use crate::query::{
    FieldSelection, JoinSpec, OutputFormat, QueryEngine, QueryRequest, Rendered,
};
use crate::warehouse::{PgWarehouse, Warehouse};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command on a fresh runtime
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_command(cli.command))
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port).await,
        Command::Tables { config, format } => tables(&config, format.as_deref()).await,
        Command::Describe {
            table,
            config,
            format,
        } => describe(&config, &table, format.as_deref()).await,
        Command::Query {
            table,
            config,
            fields,
            filter,
            join,
            order,
            format,
            count,
        } => {
            let request = QueryRequest {
                table,
                fields: FieldSelection::parse(fields.as_deref().unwrap_or("*")),
                filter,
                joins: JoinSpec::parse_list(join.as_deref().unwrap_or(""))?,
                order,
                format: OutputFormat::parse_opt(format.as_deref())?,
                count_only: count,
            };
            query(&config, &request).await
        }
    }
}

/// Load config and set the process log level
fn boot(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

async fn load_engine(config: &Config) -> CliResult<QueryEngine> {
    let warehouse: Arc<dyn Warehouse> = Arc::new(PgWarehouse::new(config.database.clone()));
    let engine = QueryEngine::load(warehouse).await?;
    Logger::info(
        "CATALOG_LOADED",
        &[
            ("schema", config.database.schema.as_str()),
            ("tables", &engine.catalog().len().to_string()),
        ],
    );
    Ok(engine)
}

/// Moderation service when enabled and an authorizer can be built
fn moderation_service(config: &Config, engine: &QueryEngine) -> Option<ModerationService> {
    if !config.moderation.enabled {
        return None;
    }
    match config.moderation.authorizer() {
        Ok(authorizer) => {
            let store = Arc::new(LocalObjectStore::new(config.moderation.store_root.clone()));
            Some(ModerationService::new(
                store,
                authorizer,
                engine.clone(),
                config.moderation.comments_table.clone(),
            ))
        }
        Err(err) => {
            Logger::warn("MODERATION_DISABLED", &[("reason", &err.to_string())]);
            None
        }
    }
}

/// Serve the HTTP API until the listener fails
pub async fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = boot(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    let engine = load_engine(&config).await?;
    let moderation = moderation_service(&config, &engine);
    let server = HttpServer::new(config.server.clone(), engine, moderation);
    server.start().await?;
    Ok(())
}

/// Print the table listing
pub async fn tables(config_path: &Path, format: Option<&str>) -> CliResult<()> {
    let config = boot(config_path)?;
    let format = OutputFormat::parse_opt(format)?;
    let engine = load_engine(&config).await?;
    write_rendered(&engine.list_tables(format))
}

/// Print one table's columns
pub async fn describe(config_path: &Path, table: &str, format: Option<&str>) -> CliResult<()> {
    let config = boot(config_path)?;
    let format = OutputFormat::parse_opt(format)?;
    let engine = load_engine(&config).await?;
    write_rendered(&engine.describe_table(table, format)?)
}

/// Run one query and print the result
pub async fn query(config_path: &Path, request: &QueryRequest) -> CliResult<()> {
    let config = boot(config_path)?;
    let engine = load_engine(&config).await?;
    let rendered = engine.handle(request).await?;
    write_rendered(&rendered)
}

fn write_rendered(rendered: &Rendered) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.body.as_bytes())?;
    if !rendered.body.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush().map_err(CliError::from)
}
