use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cuadre_reconcile::ExactPolicy;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "cuadre", version, about = "Reconcile bank statements against a plain-text ledger")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match a statement against the ledger and suggest entries for what is missing
    Reconcile {
        /// Statement file: BROU/Itaú spreadsheet, card PDF or CSV
        #[arg(long)]
        statement: PathBuf,

        /// Ledger file to read existing postings from
        #[arg(long)]
        ledger: PathBuf,

        /// Ledger account to reconcile; also books CSV files not named after a bank
        #[arg(long)]
        account: Option<String>,

        /// Description-to-account rules (JSON)
        #[arg(long, default_value = "account_mappings.json")]
        mappings: PathBuf,

        /// Exact-match rule: same-day or window
        #[arg(long, default_value = "same-day")]
        policy: ExactPolicy,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a statement and print its transactions
    Import {
        #[arg(long)]
        statement: PathBuf,

        /// Account for CSV files not named after a bank
        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List the accounts used in a ledger file
    Accounts {
        #[arg(long)]
        ledger: PathBuf,
    },
}

fn init_logging() {
    // Logs go to stderr so stdout stays clean for entries and JSON.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Reconcile { statement, ledger, account, mappings, policy, json } => {
            commands::reconcile(&commands::ReconcileArgs { statement, ledger, account, mappings, policy, json })?;
        }
        Command::Import { statement, account, json } => {
            commands::import(&statement, account.as_deref(), json)?;
        }
        Command::Accounts { ledger } => {
            commands::accounts(&ledger)?;
        }
    }

    Ok(())
}
