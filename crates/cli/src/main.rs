use crate::{
    commands::Commands,
    conn::{ConnectionPinger, PostgresConnectionPinger},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::{
    catalog::Catalog,
    settings::{MigrationSettings, RunConfig},
};
use engine_core::{error::error_chain, reporter::FileReporter};
use engine_runtime::{connection::PgConnectionProvider, orchestrator::Orchestrator};
use model::spec::table::TableSpec;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "taller-migrate",
    version = "0.1.0",
    about = "Copies Supabase data into the production Postgres database"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Env file with connection settings (defaults to ./.env when present)"
    )]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code.into(),
        Err(err) => {
            error!(error = %error_chain(&err), "Migration tool failed");
            eprintln!("Error: {err}");
            ExitCode::GeneralError.into()
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let env = EnvManager::load(cli.env_file.as_deref())?;

    match cli.command {
        Commands::RunAll {
            only,
            catalog,
            continue_on_error,
            report,
        } => {
            let mut catalog = load_catalog(catalog.as_deref())?;
            if !only.is_empty() {
                catalog = catalog.only(&only)?;
            }
            let mut config = RunConfig::from_env(env.all())?;
            if continue_on_error {
                config.settings.continue_on_error = true;
            }
            execute(config, catalog.tables(), report.as_deref()).await
        }
        Commands::Migrate {
            table,
            catalog,
            report,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let spec = catalog.get(&table)?;
            let config = RunConfig::from_env(env.all())?;
            execute(config, std::slice::from_ref(spec), report.as_deref()).await
        }
        Commands::List { catalog, json } => {
            let catalog = load_catalog(catalog.as_deref())?;
            output::print_catalog(&catalog, json)?;
            Ok(ExitCode::Success)
        }
        Commands::TestConn { target } => {
            let settings = MigrationSettings::from_env(env.all())?;
            let config = target.connection_config(env.all(), settings.connect_timeout)?;
            PostgresConnectionPinger { target, config }.ping().await?;
            println!("{target} connection OK");
            Ok(ExitCode::Success)
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog, CliError> {
    match path {
        Some(path) => {
            let catalog = Catalog::load(path)?;
            info!(path = %path.display(), tables = catalog.len(), "Loaded catalog file");
            Ok(catalog)
        }
        None => Ok(Catalog::builtin()),
    }
}

async fn execute(
    config: RunConfig,
    specs: &[TableSpec],
    report_path: Option<&Path>,
) -> Result<ExitCode, CliError> {
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    info!(
        source = %config.source.endpoint(),
        destination = %config.destination.endpoint(),
        batch_size = config.settings.batch_size,
        continue_on_error = config.settings.continue_on_error,
        log_dir = %config.settings.log_dir.display(),
        "Run configuration"
    );

    let reporter = Arc::new(FileReporter::new(config.settings.log_dir.clone()));
    let provider = Arc::new(PgConnectionProvider::new(config.source, config.destination));
    let orchestrator = Orchestrator::new(provider, reporter.clone(), config.settings)
        .with_cancellation(shutdown.cancel_token());

    let report = match specs {
        [spec] => orchestrator.run_one(spec).await?,
        _ => orchestrator.run_all(specs).await?,
    };

    output::print_summary(&report);
    for path in reporter.log_files() {
        info!(path = %path.display(), "Table log written");
    }
    if let Some(path) = report_path {
        output::write_report(&report, path).await?;
        info!(path = %path.display(), "Report written");
    }

    Ok(ExitCode::for_report(
        &report,
        shutdown.is_shutdown_requested(),
    ))
}
