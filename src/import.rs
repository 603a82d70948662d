// 📥 CSV import - bulk-load transactions from a spreadsheet export
//
// Headers: recorded_date,category,payer,payee,amount,reason,campaign
//
// Payer/payee entities and campaigns are matched by name and created when
// missing. Each row is keyed by a SHA-256 of its normalized values plus the
// number of identical rows before it in the file, so repeated rows are all
// kept and importing the same file twice inserts nothing the second time.

use crate::error::{Error, Result};
use crate::models::{
    check_money_scale, decimal_to_cents, Campaign, Category, CategoryKind, Entity, Record,
    Transaction, MONEY_SCALE_ERROR,
};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvRow {
    #[serde(default)]
    pub recorded_date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub payer: String,
    #[serde(default)]
    pub payee: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub campaign: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

impl CsvRow {
    fn date(&self, line: usize) -> Result<Option<NaiveDate>> {
        let text = self.recorded_date.trim();
        if text.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| Error::validation("recorded_date", format!("line {line}: Enter a valid date.")))
    }

    fn amount(&self, line: usize) -> Result<Decimal> {
        let text = self.amount.trim().trim_start_matches('$').replace(',', "");
        if text.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let amount = Decimal::from_str(&text)
            .map_err(|_| Error::validation("amount", format!("line {line}: Enter a number.")))?;
        if check_money_scale("amount", amount).is_err() {
            return Err(Error::validation("amount", format!("line {line}: {MONEY_SCALE_ERROR}")));
        }
        Ok(amount)
    }

    /// Idempotency key over the normalized row and its occurrence number
    ///
    /// `occurrence` counts earlier identical rows in the same file, so
    /// repeated rows stay distinct while a re-import maps onto the same keys.
    pub fn import_hash(&self, amount: Decimal, occurrence: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.normalized(amount));
        if occurrence > 0 {
            hasher.update(format!("|#{occurrence}"));
        }
        format!("{:x}", hasher.finalize())
    }

    fn normalized(&self, amount: Decimal) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.recorded_date.trim(),
            self.category.trim(),
            self.payer.trim(),
            self.payee.trim(),
            decimal_to_cents(amount),
            self.reason.trim(),
            self.campaign.trim()
        )
    }
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<CsvRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

fn entity_named(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    Ok(Some(Record::<Entity>::find_or_create_named(conn, name)?.id))
}

fn campaign_named(conn: &Connection, name: &str, registered: Option<NaiveDate>) -> Result<Option<i64>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    if let Some(campaign) = Record::<Campaign>::find_by_name(conn, name)? {
        return Ok(Some(campaign.id));
    }
    let registration_date = registered.unwrap_or_else(|| Utc::now().date_naive());
    let campaign = Record::create(conn, Campaign::new(name, registration_date))?;
    tracing::debug!(name, id = campaign.id, "created campaign during import");
    Ok(Some(campaign.id))
}

/// Insert rows inside one SQL transaction; a bad row aborts the whole import
pub fn insert_rows(conn: &Connection, rows: &[CsvRow]) -> Result<ImportSummary> {
    let tx = conn.unchecked_transaction()?;
    let mut summary = ImportSummary::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        // header is line 1
        let line = i + 2;
        let recorded_date = row.date(line)?;
        let amount = row.amount(line)?;

        let occurrence = seen.entry(row.normalized(amount)).or_insert(0);
        let hash = row.import_hash(amount, *occurrence);
        *occurrence += 1;

        if Record::<Transaction>::import_hash_exists(&tx, &hash)? {
            summary.duplicates += 1;
            continue;
        }

        let category_id = match row.category.trim() {
            "" => None,
            name => Some(Category::get_or_create(&tx, CategoryKind::Transaction, name)?.id),
        };

        Record::create(
            &tx,
            Transaction {
                category_id,
                campaign_id: campaign_named(&tx, &row.campaign, recorded_date)?,
                payer_entity_id: entity_named(&tx, &row.payer)?,
                payee_entity_id: entity_named(&tx, &row.payee)?,
                amount,
                recorded_date,
                reason: row.reason.trim().to_string(),
                import_hash: Some(hash),
                ..Default::default()
            },
        )?;
        summary.inserted += 1;
    }

    tx.commit()?;
    tracing::info!(inserted = summary.inserted, duplicates = summary.duplicates, "import finished");
    Ok(summary)
}

pub fn import_csv(conn: &Connection, csv_path: &Path) -> Result<ImportSummary> {
    let rows = load_csv(csv_path)?;
    tracing::info!(path = %csv_path.display(), rows = rows.len(), "loaded csv");
    insert_rows(conn, &rows)
}
