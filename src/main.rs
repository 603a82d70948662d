use anyhow::{Context, Result};
use campaign_ledger::config::{init_logging, DatabaseArgs};
use campaign_ledger::{import_csv, open, seed_categories, setup_database, table_counts};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Campaign finance records: database maintenance and CSV import
#[derive(Parser, Debug)]
#[command(name = "campaign-ledger", version)]
struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema (safe to re-run)
    Init,
    /// Create every category the listings and admin pickers refer to by name
    Seed,
    /// Load transactions from a CSV export
    Import {
        /// recorded_date,category,payer,payee,amount,reason,campaign
        csv: PathBuf,
    },
    /// Row counts per table
    Stats,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let conn = open(&cli.database.path)
        .with_context(|| format!("Failed to open database {}", cli.database.path.display()))?;
    setup_database(&conn).context("Failed to create schema")?;

    match cli.command {
        Command::Init => {
            println!("🔧 Database ready: {}", cli.database.path.display());
        }
        Command::Seed => {
            let created = seed_categories(&conn).context("Failed to seed categories")?;
            println!("🌱 Created {created} categories");
        }
        Command::Import { csv } => {
            println!("📂 Importing {}", csv.display());
            let summary = import_csv(&conn, &csv)
                .with_context(|| format!("Failed to import {}", csv.display()))?;
            println!("✓ Inserted: {}", summary.inserted);
            println!("✓ Duplicates skipped: {}", summary.duplicates);
        }
        Command::Stats => {
            println!("📊 {}", cli.database.path.display());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            for (table, count) in table_counts(&conn)? {
                println!("{table:<28} {count:>8}");
            }
        }
    }

    Ok(())
}
