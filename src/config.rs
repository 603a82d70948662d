// ⚙️ Configuration - command line / environment settings shared by both binaries

use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default log filter; override via RUST_LOG
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=warn";

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Path to the SQLite database file
    #[arg(long = "database", env = "LEDGER_DATABASE", default_value = "campaign_ledger.db")]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "LEDGER_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Enables /admin (HTTP Basic, user "admin") when set
    #[arg(long, env = "LEDGER_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

/// Install the fmt subscriber with an env-driven filter
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        database: DatabaseArgs,

        #[command(flatten)]
        server: ServerArgs,
    }

    #[test]
    fn test_explicit_flags() {
        let cli = TestCli::try_parse_from([
            "test",
            "--database",
            "/tmp/ledger.db",
            "--bind",
            "0.0.0.0:8080",
            "--admin-password",
            "secret",
        ])
        .unwrap();

        assert_eq!(cli.database.path, PathBuf::from("/tmp/ledger.db"));
        assert_eq!(cli.server.bind.port(), 8080);
        assert_eq!(cli.server.admin_password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        assert!(TestCli::try_parse_from(["test", "--bind", "not-an-address"]).is_err());
    }
}
