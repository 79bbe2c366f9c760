mod cli;
mod config;
mod error;
mod gateway;
mod migration;
mod server;
mod store;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::{Cli, Command};
use config::MigratorConfig;
use error::MigratorError;
use gateway::HttpGateway;
use migration::Orchestrator;
use server::MigrationService;
use store::SqliteClientStore;
use ui::MigrationProgress;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => MigratorConfig::load_from(path)?,
        None => MigratorConfig::load()?,
    };
    if let Some(database) = cli.database {
        config.database = Some(database);
    }

    let service = build_service(&config)?;

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            server::serve(listener, Arc::new(service)).await?;
        }
        Command::Legacy => {
            ui::print_clients(&service.legacy_clients()?);
        }
        Command::Migrated => {
            ui::print_clients(&service.new_clients()?);
        }
        Command::Migrate { id } => {
            let progress = MigrationProgress::start(id);
            let record = service.migrate_with_record(id).await?;
            progress.complete(&record);
            progress.print_audit(&record);
            if !record.outcome.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

// RUST_LOG wins when set; otherwise info, or debug with --verbose.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_service(config: &MigratorConfig) -> Result<MigrationService, MigratorError> {
    let store = match &config.database {
        Some(path) => SqliteClientStore::open(path)?,
        None => SqliteClientStore::in_memory()?,
    };
    if config.seed_sample_clients {
        store.seed_sample_clients()?;
    }

    let gateway = HttpGateway::new(config.gateway())?;
    let service = Orchestrator::new(store, gateway);

    let clients = service.store().count()?;
    let gw = service.gateway().config();
    info!(
        clients,
        external_migration = gw.enabled,
        api_url = %gw.api_url,
        timeout_secs = gw.timeout.as_secs(),
        "client migrator ready"
    );
    Ok(service)
}
