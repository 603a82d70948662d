// 💸 Transactions - a single recorded money movement

use crate::error::Result;
use crate::models::category::{Category, CategoryKind};
use crate::models::{decimal_to_cents, money, opt_date_value, Field, Record, Table, Target};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub category_id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub payer_entity_id: Option<i64>,
    pub payee_entity_id: Option<i64>,
    pub amount: Decimal,
    pub recorded_date: Option<NaiveDate>,
    pub reason: String,
    pub document_id: Option<i64>,
    pub notes: String,
    /// Set only by the CSV importer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_hash: Option<String>,
}

impl Table for Transaction {
    const TABLE: &'static str = "transactions";
    const KIND: &'static str = "transaction";
    const FIELDS: &'static [Field] = &[
        Field::category(CategoryKind::Transaction),
        Field::link("campaign_id", "Campaign", Target::Campaign),
        Field::link("payer_entity_id", "Payer", Target::Entity),
        Field::link("payee_entity_id", "Recipient", Target::Entity),
        Field::money("amount", "Amount"),
        Field::date("recorded_date", "Date", false),
        Field::text("reason", "Reason", 1000),
        Field::link("document_id", "Document", Target::Document),
        Field::notes(),
        Field::text("import_hash", "Import hash", 64),
    ];

    fn money_values(&self) -> Vec<(&'static str, Decimal)> {
        vec![("amount", self.amount)]
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.campaign_id.into(),
            self.payer_entity_id.into(),
            self.payee_entity_id.into(),
            Value::Integer(decimal_to_cents(self.amount)),
            opt_date_value(self.recorded_date),
            self.reason.clone().into(),
            self.document_id.into(),
            self.notes.clone().into(),
            self.import_hash.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Transaction {
            category_id: row.get(offset)?,
            campaign_id: row.get(offset + 1)?,
            payer_entity_id: row.get(offset + 2)?,
            payee_entity_id: row.get(offset + 3)?,
            amount: money(row, offset + 4)?,
            recorded_date: row.get(offset + 5)?,
            reason: row.get(offset + 6)?,
            document_id: row.get(offset + 7)?,
            notes: row.get(offset + 8)?,
            import_hash: row.get(offset + 9)?,
        })
    }
}

impl Record<Transaction> {
    pub fn paid_by(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "payer_entity_id = ?1", [entity_id], "recorded_date DESC, id")
    }

    pub fn received_by(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "payee_entity_id = ?1", [entity_id], "recorded_date DESC, id")
    }

    pub fn for_campaign(conn: &Connection, campaign_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "campaign_id = ?1", [campaign_id], "recorded_date DESC, id")
    }

    pub fn for_document(conn: &Connection, document_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "document_id = ?1", [document_id], "recorded_date DESC, id")
    }

    /// Newest transactions of a named category; empty when the category is missing
    pub fn latest_in_category(conn: &Connection, category: &str, limit: usize) -> Result<Vec<Self>> {
        let Some(category) = Category::find_by_name(conn, CategoryKind::Transaction, category)? else {
            return Ok(Vec::new());
        };
        let order = format!("recorded_date DESC, id DESC LIMIT {limit}");
        Self::filter(conn, "category_id = ?1", [category.id], &order)
    }

    pub fn import_hash_exists(conn: &Connection, hash: &str) -> Result<bool> {
        Ok(!Self::filter(conn, "import_hash = ?1", [hash], "id")?.is_empty())
    }
}
