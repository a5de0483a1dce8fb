//! # SRD Grounding CLI (`srd`)
//!
//! Commands for initializing the store, running the ingest pipeline,
//! and serving the read-only HTTP API.
//!
//! ```bash
//! srd init                 # create the store and canonical indexes
//! srd ingest               # validate, upsert, emit cache, report
//! srd ingest --dry-run     # validate and count, no writes
//! srd serve                # start the HTTP API
//! ```
//!
//! Exit codes for `srd ingest`: 0 success, 2 schema validation failure,
//! 1 any other fatal error.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use srd_grounding::config::Config;
use srd_grounding::error::IngestError;
use srd_grounding::{ingest, reconcile, server, store};

/// SRD reference-data publishing pipeline.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file; every setting has a working default, so a
/// missing file falls back to the built-in configuration.
#[derive(Parser)]
#[command(
    name = "srd",
    about = "SRD 5.1 reference-data pipeline — validate, ingest, cache, serve",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/srd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store: create the database file, both
    /// collections, and the canonical index set. Idempotent.
    Init,

    /// Run the ingest pipeline: load, validate, reconcile indexes,
    /// upsert, emit cache artifacts, print a report.
    Ingest {
        /// Validate and count only — no store or cache writes.
        #[arg(long)]
        dry_run: bool,
    },

    /// Start the read-only HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::minimal()
    };

    let result = match cli.command {
        Commands::Init => run_init(&config).await,
        Commands::Ingest { dry_run } => ingest::run_ingest(&config, dry_run).await,
        Commands::Serve => server::run_server(&config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<IngestError>()
            .map(IngestError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run_init(config: &Config) -> anyhow::Result<()> {
    let pool = store::connect(&config.ingest_store_url()).await?;
    store::ensure_collections(&pool).await?;
    reconcile::reconcile_indexes(&pool).await?;
    pool.close().await;
    println!("Store initialized.");
    Ok(())
}
