//! SAV Audition CLI - store directory checks, seeding and exports.
//!
//! # Usage
//!
//! ```bash
//! # List the configured stores (never prints PINs)
//! sav-cli stores list
//!
//! # Check a PIN against the store table
//! sav-cli pin verify -s DIJ -p 5310
//!
//! # Load a YAML fixture into the document store
//! sav-cli seed fixtures/demo.yaml
//!
//! # Validate a fixture without writing anything
//! sav-cli seed fixtures/demo.yaml --dry-run
//!
//! # Export a collection to JSON
//! sav-cli export orders -o orders.json --magasin DIJ
//! ```
//!
//! # Commands
//!
//! - `stores list` - Show the store directory
//! - `pin verify` - Check a store code and PIN
//! - `seed` - Load records from a YAML fixture
//! - `export` - Dump a collection to a JSON file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "sav-cli")]
#[command(author, version, about = "SAV Audition CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the store directory
    Stores {
        #[command(subcommand)]
        action: StoresAction,
    },
    /// Check store PINs
    Pin {
        #[command(subcommand)]
        action: PinAction,
    },
    /// Load records from a YAML fixture
    Seed {
        /// Fixture file
        file: PathBuf,

        /// Validate and build records in memory only
        #[arg(long)]
        dry_run: bool,
    },
    /// Export a collection as JSON
    Export {
        /// Collection name (clients, orders, decomptes, invoices, interventions, users, stores)
        collection: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Only records of this store
        #[arg(short, long)]
        magasin: Option<String>,
    },
}

#[derive(Subcommand)]
enum StoresAction {
    /// List store codes and names
    List,
}

#[derive(Subcommand)]
enum PinAction {
    /// Check a store code and PIN
    Verify {
        /// Store code
        #[arg(short, long)]
        store: String,

        /// 4-digit PIN
        #[arg(short, long)]
        pin: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Stores { action } => match action {
            StoresAction::List => commands::stores::list()?,
        },
        Commands::Pin { action } => match action {
            PinAction::Verify { store, pin } => commands::stores::verify_pin(&store, &pin)?,
        },
        Commands::Seed { file, dry_run } => {
            commands::seed::run(&file, dry_run).await?;
        }
        Commands::Export {
            collection,
            output,
            magasin,
        } => {
            commands::export::run(&collection, &output, magasin.as_deref()).await?;
        }
    }
    Ok(())
}
