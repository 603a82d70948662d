// Campaign Ledger - Web Server

use anyhow::{Context, Result};
use campaign_ledger::config::{init_logging, DatabaseArgs, ServerArgs};
use campaign_ledger::server::{serve, AppState};
use campaign_ledger::{open, setup_database};
use clap::Parser;

/// Public campaign finance pages plus the optional admin
#[derive(Parser, Debug)]
#[command(name = "ledger-server", version)]
struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    server: ServerArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let conn = open(&cli.database.path)
        .with_context(|| format!("Failed to open database {}", cli.database.path.display()))?;
    setup_database(&conn).context("Failed to create schema")?;
    tracing::info!(path = %cli.database.path.display(), "database opened");

    let state = AppState::new(conn, cli.server.admin_password).context("Failed to load templates")?;
    serve(state, cli.server.bind).await
}
