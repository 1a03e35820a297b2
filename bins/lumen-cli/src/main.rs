//! lumen-cli — Command-line tools for the Lumen trust directory.
//!
//! Imports ledger snapshots, runs the batch scorer, and prints scores, trust
//! graphs and relations straight from the local database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lumen_core::cancel::Cancellation;
use lumen_core::config::ReputationConfig;
use lumen_core::constants::DEFAULT_MAX_WEIGHT;
use lumen_core::relation::RelationTables;
use lumen_store::{RocksStore, Snapshot};
use lumen_trust::ReputationService;
use serde::Serialize;
use tracing::info;

/// Lumen trust directory tools.
#[derive(Parser)]
#[command(name = "lumen-cli")]
#[command(version, about = "Reputation scores and trust graphs for ledger accounts.")]
struct Cli {
    /// Database directory (default: $LUMEN_DB_PATH, then <data dir>/lumen/db).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Upper bound on a single rater's weight.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_WEIGHT)]
    max_weight: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JSON ledger snapshot, replacing accounts and relations.
    Import(ImportArgs),
    /// Recompute and persist every account's score.
    Score,
    /// Print an account's persisted score.
    ShowScore(AccountArgs),
    /// Print an account's two-level trust graph.
    Graph(AccountArgs),
    /// Print an account's reconciled relations.
    Relations(AccountArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// Path to the snapshot JSON file.
    path: PathBuf,
}

#[derive(Args)]
struct AccountArgs {
    /// Account identifier (56 characters, starting with G).
    account: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ReputationConfig::with_max_weight(cli.max_weight)?;
    let db_path = resolve_db_path(cli.db)?;
    let store = RocksStore::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;
    let service = ReputationService::new(Arc::new(store), RelationTables::default(), config)?;
    let cancel = Cancellation::new();

    match cli.command {
        Commands::Import(args) => import(service.store(), args),
        Commands::Score => {
            let report = service.run_batch(&cancel)?;
            service.store().flush()?;
            info!(written = report.written, "Scores updated");
            print_json(&report)
        }
        Commands::ShowScore(args) => print_or_absent(service.get_score(&args.account, &cancel)?),
        Commands::Graph(args) => print_or_absent(service.get_graph(&args.account, &cancel)?),
        Commands::Relations(args) => print_or_absent(service.get_relations(&args.account, &cancel)?),
    }
}

fn import(store: &RocksStore, args: ImportArgs) -> Result<()> {
    let snapshot = Snapshot::from_path(&args.path)
        .with_context(|| format!("reading snapshot {}", args.path.display()))?;
    let report = store.import(&snapshot).context("importing snapshot")?;
    store.flush()?;
    print_json(&report)
}

/// Resolve the database path from the flag, the environment, or the default.
fn resolve_db_path(path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = path {
        return Ok(p);
    }
    if let Ok(p) = std::env::var("LUMEN_DB_PATH") {
        return Ok(PathBuf::from(p));
    }
    lumen_store::default_db_path().context("Could not determine data directory")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_or_absent<T: Serialize>(value: Option<T>) -> Result<()> {
    match value {
        Some(v) => print_json(&v),
        None => {
            println!("no reputation data yet");
            Ok(())
        }
    }
}
