use crate::{commands::Commands, error::CliError, output::Response};
use clap::Parser;
use connectors::{source::rest::RestSource, sql::postgres::PgTarget};
use engine::{
    orchestrate::{reload_table, Migrator},
    settings::Settings,
    verify::{compare_samples, compare_structure},
};
use model::{report::RunStatus, table::TableKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

#[derive(Parser)]
#[command(
    name = "sitesync",
    version,
    about = "One-shot migration of 5G rollout tables into the local database"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => {}
        Err(err) => {
            // Nothing escapes the boundary uncaught; every failure becomes
            // a structured error response and a non-zero exit.
            let _ = output::print(&Response::error(err.to_string()));
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    let settings = Settings::from_env()?;
    let source = RestSource::new(
        &settings.source_url,
        &settings.source_api_key,
        settings.request_timeout(),
    )?;
    let target = PgTarget::connect(&settings.target_url).await?;

    match command {
        Commands::Migrate { table, all, clear } => {
            let tables = selected_tables(table.as_deref(), all)?;
            let migrator = Migrator::new(&source, &target, &settings);
            let summary = migrator.run(&tables, clear).await?;

            let partial = summary.status == RunStatus::Partial;
            let response = if partial {
                Response::failure(
                    format!(
                        "migration partial: {} of {} tables failed",
                        summary.tables_failed(),
                        summary.outcomes.len()
                    ),
                    summary,
                )
            } else {
                Response::success("migration complete", summary)
            };
            output::print(&response)?;
            if partial {
                std::process::exit(1);
            }
        }
        Commands::Reload { table } => {
            let table: TableKind = table.parse()?;
            let outcome = reload_table(&source, &target, &settings, table).await;
            let ok = outcome.success;
            let response = if ok {
                Response::success(format!("reload of {table} finished"), outcome)
            } else {
                Response::failure(format!("reload of {table} finished with errors"), outcome)
            };
            output::print(&response)?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::CompareStructure { table, limit } => {
            let table: TableKind = table.parse()?;
            let diff = compare_structure(&source, &target, table, limit).await?;
            output::print(&Response::success(
                format!("structure comparison for {table}"),
                diff,
            ))?;
        }
        Commands::CompareSamples {
            table,
            limit,
            program,
        } => {
            let table: TableKind = table.parse()?;
            let diffs =
                compare_samples(&source, &target, table, limit, program.as_deref()).await?;
            output::print(&Response::success(
                format!("sample comparison for {table}: {} records", diffs.len()),
                diffs,
            ))?;
        }
        Commands::TestConn => {
            use connectors::{source::SourceReader, sql::TargetStore};
            source.ping().await?;
            info!("source store reachable");
            target
                .ping()
                .await
                .map_err(engine::error::EngineError::Db)?;
            info!("target store reachable");
            output::print(&Response::success("both stores reachable", ()))?;
        }
    }

    Ok(())
}

fn selected_tables(table: Option<&str>, all: bool) -> Result<Vec<TableKind>, CliError> {
    match table {
        Some(name) if !all => Ok(vec![name.parse()?]),
        _ => Ok(TableKind::ALL.to_vec()),
    }
}
