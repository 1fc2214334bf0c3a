use std::{
    io::{self, BufRead as _, Write as _},
    path::PathBuf,
    sync::Arc,
};

use catalog_db::CatalogDb;
use clap::{Parser, Subcommand};
use common::{config::Config, logging};
use ingest::{Phase, Pipeline};

/// Prepares a spatially sharded catalog for the distributed query engine:
/// partitions input tables into chunks, loads them into the store and
/// publishes the empty-chunk manifest and metadata table the query router
/// depends on.
#[derive(Parser, Debug)]
#[command(name = "loadctl")]
struct Args {
    /// Path to the deployment config file (TOML).
    #[arg(long, short, env = "SKYSHARD_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and recreate the catalog and metadata schemas. Required before
    /// any (re)load; loads never clean up after themselves.
    Reset,

    /// Partition, load and publish one table. Dependent tables must be
    /// loaded after their parent.
    Load {
        /// Name of a table configured under [tables.<name>].
        #[arg(long)]
        table: String,

        /// Path to the table's CREATE TABLE definition file.
        #[arg(long)]
        schema: PathBuf,

        /// Path to the delimited input data file.
        #[arg(long)]
        data: PathBuf,

        /// Ask for confirmation before each pipeline phase.
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    logging::register_logger();
    let args = Args::parse();

    let config = Arc::new(Config::load(&args.config)?);
    let db = CatalogDb::connect(&config.store_url).await?;

    match args.command {
        Command::Reset => {
            Pipeline::new(db, config).reset().await?;
            tracing::info!("catalog and metadata schemas reset");
        }
        Command::Load {
            table,
            schema,
            data,
            confirm,
        } => {
            let mut pipeline = Pipeline::new(db, config);
            if confirm {
                pipeline = pipeline.with_phase_gate(Arc::new(confirm_phase));
            }
            let outcome = pipeline.load_table(&table, &schema, &data).await?;
            tracing::info!(
                table = %outcome.table,
                non_empty = outcome.non_empty.len(),
                meta_rows = outcome.meta_rows,
                manifest = %outcome.manifest_path.display(),
                "load complete"
            );
        }
    }
    Ok(())
}

/// Interactive gate between pipeline phases. It lives here and not in the
/// pipeline: the core never blocks on an operator.
fn confirm_phase(phase: Phase) -> bool {
    eprint!("continue with the {phase} phase? [Y/n] ");
    io::stderr().flush().ok();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    let answer = line.trim();
    answer.is_empty() || answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
