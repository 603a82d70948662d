// 🗄️ Relational schema - every table, key, and delete rule lives here
//
// Referential rules are declared on the tables and enforced by SQLite:
// - category names are UNIQUE
// - optional links are nullable and SET NULL when the target row goes away
// - relationship members and association rows CASCADE

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) a database file with foreign keys enforced and WAL enabled
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// In-memory database with the full schema, used by tests and demos
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Category tables (all share the same shape)
    // ==========================================================================
    for table in [
        "entity_categories",
        "industry_sectors",
        "relationship_categories",
        "campaign_categories",
        "election_categories",
        "document_categories",
        "transaction_categories",
        "address_categories",
    ] {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    name TEXT UNIQUE NOT NULL
                )"
            ),
            [],
        )?;
    }

    // ==========================================================================
    // Entities
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS industries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            name TEXT UNIQUE NOT NULL,
            sector_id INTEGER REFERENCES industry_sectors(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            category_id INTEGER REFERENCES entity_categories(id) ON DELETE SET NULL,
            first_name TEXT NOT NULL DEFAULT '',
            middle_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL,
            prefix TEXT NOT NULL DEFAULT '',
            suffix TEXT NOT NULL DEFAULT '',
            nickname TEXT NOT NULL DEFAULT '',
            occupation TEXT NOT NULL DEFAULT '',
            industry_id INTEGER REFERENCES industries(id) ON DELETE SET NULL,
            notes TEXT NOT NULL DEFAULT '',
            opencorporates_link TEXT NOT NULL DEFAULT '',
            littlesis_link TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS external_ids (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            parent_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            child_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            number TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS relationships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            category_id INTEGER REFERENCES relationship_categories(id) ON DELETE SET NULL,
            parent_entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            child_entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            notes TEXT NOT NULL DEFAULT ''
        );",
    )?;

    // ==========================================================================
    // Offices, elections, campaigns
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS offices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            government_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            holder_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS former_office_holders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            office_id INTEGER REFERENCES offices(id) ON DELETE SET NULL,
            entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS elections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            category_id INTEGER REFERENCES election_categories(id) ON DELETE SET NULL,
            government_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            date TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS campaigns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            category_id INTEGER REFERENCES campaign_categories(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            registration_date TEXT NOT NULL,
            election_id INTEGER REFERENCES elections(id) ON DELETE SET NULL,
            candidate_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            treasurer_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            committee_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            office_sought_id INTEGER REFERENCES offices(id) ON DELETE SET NULL,
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS election_campaigns (
            election_id INTEGER NOT NULL REFERENCES elections(id) ON DELETE CASCADE,
            campaign_id INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
            PRIMARY KEY (election_id, campaign_id)
        );",
    )?;

    // ==========================================================================
    // Documents and reported aggregates (amounts stored as integer cents)
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            category_id INTEGER REFERENCES document_categories(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            filer_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            officer_oath_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            date_filed TEXT NOT NULL,
            coverage_start_date TEXT NOT NULL,
            coverage_end_date TEXT NOT NULL,
            uploaded_file TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS reported_totals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            document_id INTEGER UNIQUE REFERENCES documents(id) ON DELETE SET NULL,
            unitemized_contributions INTEGER NOT NULL DEFAULT 0,
            contributions INTEGER NOT NULL DEFAULT 0,
            unitemized_expenditures INTEGER NOT NULL DEFAULT 0,
            expenditures INTEGER NOT NULL DEFAULT 0,
            maintained_contributions INTEGER NOT NULL DEFAULT 0,
            principal_outstanding_loans INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS reported_subtotals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            document_id INTEGER UNIQUE REFERENCES documents(id) ON DELETE SET NULL,
            monetary_political_contributions INTEGER NOT NULL DEFAULT 0,
            non_monetary_political_contributions INTEGER NOT NULL DEFAULT 0,
            pledged_contributions INTEGER NOT NULL DEFAULT 0,
            monetary_corporate_labor_contributions INTEGER NOT NULL DEFAULT 0,
            non_monetary_corporate_labor_contributions INTEGER NOT NULL DEFAULT 0,
            pledged_corporate_labor_contributions INTEGER NOT NULL DEFAULT 0,
            loans INTEGER NOT NULL DEFAULT 0,
            expenditures_from_contributions INTEGER NOT NULL DEFAULT 0,
            unpaid_incurred_obligations INTEGER NOT NULL DEFAULT 0,
            purchased_investments_with_contributions INTEGER NOT NULL DEFAULT 0,
            expenditures_credit_card INTEGER NOT NULL DEFAULT 0,
            expenditures_personal_funds INTEGER NOT NULL DEFAULT 0,
            expenditures_from_contributions_candidate_business INTEGER NOT NULL DEFAULT 0,
            expenditures_non_political_from_contributions INTEGER NOT NULL DEFAULT 0,
            interest_credit_gains_refunds_contributions_returned INTEGER NOT NULL DEFAULT 0
        );",
    )?;

    // ==========================================================================
    // Transactions
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            category_id INTEGER REFERENCES transaction_categories(id) ON DELETE SET NULL,
            campaign_id INTEGER REFERENCES campaigns(id) ON DELETE SET NULL,
            payer_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            payee_entity_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            recorded_date TEXT,
            reason TEXT NOT NULL DEFAULT '',
            document_id INTEGER REFERENCES documents(id) ON DELETE SET NULL,
            notes TEXT NOT NULL DEFAULT '',
            import_hash TEXT UNIQUE
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_recorded_date ON transactions(recorded_date);
        CREATE INDEX IF NOT EXISTS idx_transactions_campaign ON transactions(campaign_id);",
    )?;

    // ==========================================================================
    // Addresses and contact records
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS addresses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            category_id INTEGER REFERENCES address_categories(id) ON DELETE SET NULL,
            building_number TEXT NOT NULL DEFAULT '',
            street_name TEXT NOT NULL DEFAULT '',
            unit_number TEXT NOT NULL DEFAULT '',
            floor_number TEXT NOT NULL DEFAULT '',
            city_name TEXT NOT NULL DEFAULT '',
            state_name TEXT NOT NULL DEFAULT '',
            county_name TEXT NOT NULL DEFAULT '',
            zip_code TEXT NOT NULL,
            zip_code_extension TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS phone_numbers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            country_code TEXT NOT NULL DEFAULT '',
            area_code TEXT NOT NULL DEFAULT '',
            number TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            owner_id INTEGER REFERENCES entities(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            address TEXT UNIQUE NOT NULL,
            owner_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS websites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            address TEXT UNIQUE NOT NULL,
            owner_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            notes TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS assumed_names (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT ''
        );",
    )?;

    // ==========================================================================
    // Association tables
    // ==========================================================================
    for (table, owner_column, owner_table) in ASSOCIATION_TABLES {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    {owner_column} INTEGER NOT NULL REFERENCES {owner_table}(id) ON DELETE CASCADE,
                    entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
                    PRIMARY KEY ({owner_column}, entity_id)
                )"
            ),
            [],
        )?;
    }

    Ok(())
}

/// Entity association tables: (table, owner column, owner table)
const ASSOCIATION_TABLES: [(&str, &str, &str); 6] = [
    ("address_residents", "address_id", "addresses"),
    ("address_owners", "address_id", "addresses"),
    ("phone_number_entities", "phone_number_id", "phone_numbers"),
    ("email_entities", "email_id", "emails"),
    ("website_entities", "website_id", "websites"),
    ("assumed_name_entities", "assumed_name_id", "assumed_names"),
];

/// Row counts for every record table, in schema order
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::new();
    for table in RECORD_TABLES {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        counts.push((table, count));
    }
    Ok(counts)
}

pub const RECORD_TABLES: [&str; 25] = [
    "entity_categories",
    "industry_sectors",
    "industries",
    "entities",
    "external_ids",
    "relationship_categories",
    "relationships",
    "campaign_categories",
    "offices",
    "former_office_holders",
    "election_categories",
    "elections",
    "campaigns",
    "document_categories",
    "documents",
    "reported_totals",
    "reported_subtotals",
    "transaction_categories",
    "transactions",
    "address_categories",
    "addresses",
    "phone_numbers",
    "emails",
    "websites",
    "assumed_names",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let counts = table_counts(&conn).unwrap();
        assert_eq!(counts.len(), RECORD_TABLES.len());
        assert!(counts.iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let conn = open_in_memory().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);

        let result = conn.execute(
            "INSERT INTO relationships (uuid, parent_entity_id, child_entity_id) VALUES ('x', 41, 42)",
            [],
        );
        assert!(result.is_err());
    }
}
