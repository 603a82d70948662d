// Campaign Ledger - Core Library
// Exposes all modules for use in CLI, web server, and tests

pub mod admin;     // Admin form configuration + generic CRUD
pub mod config;    // clap args shared by both binaries, logging setup
pub mod error;
pub mod import;    // CSV -> transactions, idempotent
pub mod listing;   // Filter/sort option tables of the list views
pub mod models;
pub mod pages;     // List + detail page contexts
pub mod schema;
pub mod seed;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use error::{Error, Result};
pub use import::{import_csv, load_csv, CsvRow, ImportSummary};
pub use listing::{ListingOptions, ListingQuery};
pub use models::{
    Address, AssumedName, Campaign, Category, CategoryKind, Document, Election, Email, Entity,
    ExternalId, FormerOfficeHolder, Industry, Office, PhoneNumber, Record, Relationship,
    ReportedSubtotals, ReportedTotals, Transaction, Website,
};
pub use schema::{open, open_in_memory, setup_database, table_counts};
pub use seed::seed_categories;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
