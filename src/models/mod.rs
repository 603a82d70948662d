// 📇 Record layer - typed rows over the relational schema
//
// Every record type implements `Table`: a static column description plus
// row <-> value conversion. `Record<T>` adds the surrogate key and the public
// UUID and provides create / get / update / delete / filter for all of them.

pub mod association;
pub mod campaign;
pub mod category;
pub mod contact;
pub mod document;
pub mod entity;
pub mod office;
pub mod transaction;

use crate::error::{Error, Result};
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, Params, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use uuid::Uuid;

pub use association::Association;
pub use campaign::{Campaign, Election};
pub use category::{Category, CategoryKind};
pub use contact::{Address, AssumedName, Email, PhoneNumber, Website};
pub use document::{Document, ReportedSubtotals, ReportedTotals};
pub use entity::{Entity, ExternalId, Industry, Relationship};
pub use office::{FormerOfficeHolder, Office};
pub use transaction::Transaction;

// ============================================================================
// FIELD DESCRIPTIONS
// ============================================================================

/// Linkable record types (targets of foreign keys that are not categories)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Entity,
    Industry,
    Office,
    Election,
    Campaign,
    Document,
}

impl Target {
    pub fn table(&self) -> &'static str {
        match self {
            Target::Entity => "entities",
            Target::Industry => "industries",
            Target::Office => "offices",
            Target::Election => "elections",
            Target::Campaign => "campaigns",
            Target::Document => "documents",
        }
    }

    /// SQL expression producing the short display label of a row
    pub fn label_sql(&self) -> &'static str {
        match self {
            Target::Entity => "TRIM(first_name || ' ' || last_name)",
            Target::Election => "date",
            _ => "name",
        }
    }

    /// Path segment of the public pages for this record type
    pub fn route(&self) -> &'static str {
        match self {
            Target::Entity => "entity",
            Target::Industry => "industry",
            Target::Office => "office",
            Target::Election => "election",
            Target::Campaign => "campaign",
            Target::Document => "document",
        }
    }

    /// (id, label) pairs for pickers, optionally limited to one entity category
    pub fn choices(&self, conn: &Connection, category_id: Option<i64>) -> Result<Vec<(i64, String)>> {
        let order = match self {
            Target::Entity => "last_name, first_name, id",
            Target::Election => "date DESC, id",
            _ => "name, id",
        };
        let choices = match category_id {
            Some(category_id) => {
                let sql = format!(
                    "SELECT id, {} FROM {} WHERE category_id = ?1 ORDER BY {}",
                    self.label_sql(),
                    self.table(),
                    order
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([category_id], choice_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!(
                    "SELECT id, {} FROM {} ORDER BY {}",
                    self.label_sql(),
                    self.table(),
                    order
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], choice_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(choices)
    }
}

fn choice_row(row: &Row<'_>) -> rusqlite::Result<(i64, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_len: usize, required: bool },
    Notes,
    Url { max_len: usize },
    Date { required: bool },
    /// decimal(12, 2), stored as integer cents
    Money,
    Category(CategoryKind),
    Link { target: Target, required: bool },
    File,
}

/// One stored column of a record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub column: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn text(column: &'static str, label: &'static str, max_len: usize) -> Self {
        Field { column, label, kind: FieldKind::Text { max_len, required: false } }
    }

    pub const fn required_text(column: &'static str, label: &'static str, max_len: usize) -> Self {
        Field { column, label, kind: FieldKind::Text { max_len, required: true } }
    }

    pub const fn notes() -> Self {
        Field { column: "notes", label: "Notes", kind: FieldKind::Notes }
    }

    pub const fn url(column: &'static str, label: &'static str, max_len: usize) -> Self {
        Field { column, label, kind: FieldKind::Url { max_len } }
    }

    pub const fn date(column: &'static str, label: &'static str, required: bool) -> Self {
        Field { column, label, kind: FieldKind::Date { required } }
    }

    pub const fn money(column: &'static str, label: &'static str) -> Self {
        Field { column, label, kind: FieldKind::Money }
    }

    pub const fn category(kind: CategoryKind) -> Self {
        Field { column: "category_id", label: "Category", kind: FieldKind::Category(kind) }
    }

    pub const fn link(column: &'static str, label: &'static str, target: Target) -> Self {
        Field { column, label, kind: FieldKind::Link { target, required: false } }
    }

    pub const fn required_link(column: &'static str, label: &'static str, target: Target) -> Self {
        Field { column, label, kind: FieldKind::Link { target, required: true } }
    }

    pub const fn file(column: &'static str, label: &'static str) -> Self {
        Field { column, label, kind: FieldKind::File }
    }
}

/// Largest magnitude (exclusive) of a decimal(12, 2) amount, in cents
pub const MAX_CENTS: u64 = 1_000_000_000_000;

/// Check column values against their field rules before they reach SQL
pub fn validate_values(fields: &[Field], values: &[Value]) -> Result<()> {
    for (field, value) in fields.iter().zip(values) {
        match (field.kind, value) {
            (FieldKind::Text { max_len, required }, Value::Text(text)) => {
                if required && text.trim().is_empty() {
                    return Err(Error::validation(field.column, "This field is required."));
                }
                check_length(field, text, max_len)?;
            }
            (FieldKind::Text { required: true, .. }, Value::Null) => {
                return Err(Error::validation(field.column, "This field is required."));
            }
            (FieldKind::Url { max_len }, Value::Text(text)) => {
                check_length(field, text, max_len)?;
                if !text.is_empty() && !(text.starts_with("http://") || text.starts_with("https://")) {
                    return Err(Error::validation(field.column, "Enter a valid URL."));
                }
            }
            (FieldKind::Money, Value::Integer(cents)) => {
                if cents.unsigned_abs() >= MAX_CENTS {
                    return Err(Error::validation(
                        field.column,
                        "Ensure that there are no more than 12 digits in total.",
                    ));
                }
            }
            (FieldKind::Date { required: true }, Value::Null)
            | (FieldKind::Link { required: true, .. }, Value::Null) => {
                return Err(Error::validation(field.column, "This field is required."));
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_length(field: &Field, text: &str, max_len: usize) -> Result<()> {
    let len = text.chars().count();
    if len > max_len {
        return Err(Error::validation(
            field.column,
            format!("Ensure this value has at most {max_len} characters (it has {len})."),
        ));
    }
    Ok(())
}

// ============================================================================
// VALUE CONVERSION HELPERS
// ============================================================================

pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Reject amounts with more than two decimal places
pub fn check_money_scale(column: &str, amount: Decimal) -> Result<()> {
    if amount.normalize().scale() > 2 {
        return Err(Error::validation(column, MONEY_SCALE_ERROR));
    }
    Ok(())
}

pub const MONEY_SCALE_ERROR: &str = "Ensure that there are no more than 2 decimal places.";

/// Amount in cents. Rounds sub-cent digits, so callers holding user input
/// must pass it through `check_money_scale` first; out-of-range amounts
/// saturate and are rejected by validation.
pub fn decimal_to_cents(amount: Decimal) -> i64 {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    i64::try_from(rounded.mantissa()).unwrap_or(i64::MAX)
}

pub fn date_value(date: chrono::NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

pub fn opt_date_value(date: Option<chrono::NaiveDate>) -> Value {
    date.map(date_value).unwrap_or(Value::Null)
}

pub fn money(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    Ok(cents_to_decimal(row.get(idx)?))
}

pub fn read_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// TABLE TRAIT + RECORD
// ============================================================================

pub trait Table: Sized {
    /// SQL table name
    const TABLE: &'static str;

    /// Human name used in errors and logs
    const KIND: &'static str;

    /// Stored columns in the order of `to_values` / `from_row`
    const FIELDS: &'static [Field];

    fn to_values(&self) -> Vec<Value>;

    /// (column, amount) of every money field, checked for scale before writing
    fn money_values(&self) -> Vec<(&'static str, Decimal)> {
        Vec::new()
    }

    /// Build from a row whose first stored column sits at `offset`
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;
}

/// A stored row: surrogate key, public identifier, and the column values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    pub id: i64,
    pub uuid: Uuid,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

fn check_money_values<T: Table>(data: &T) -> Result<()> {
    for (column, amount) in data.money_values() {
        check_money_scale(column, amount)?;
    }
    Ok(())
}

fn column_list(fields: &[Field]) -> String {
    fields.iter().map(|f| f.column).collect::<Vec<_>>().join(", ")
}

impl<T: Table> Record<T> {
    pub fn create(conn: &Connection, data: T) -> Result<Self> {
        check_money_values(&data)?;
        let values = data.to_values();
        validate_values(T::FIELDS, &values)?;

        let uuid = Uuid::new_v4();
        let placeholders: Vec<String> = (2..=values.len() + 1).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} (uuid, {}) VALUES (?1, {})",
            T::TABLE,
            column_list(T::FIELDS),
            placeholders.join(", ")
        );

        let mut params = Vec::with_capacity(values.len() + 1);
        params.push(Value::Text(uuid.to_string()));
        params.extend(values);
        conn.execute(&sql, params_from_iter(params))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(kind = T::KIND, id, %uuid, "record created");

        Ok(Record { id, uuid, data })
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Self> {
        Self::filter(conn, "id = ?1", [id], "id")?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(T::KIND, id))
    }

    /// Resolve an optional foreign key
    pub fn find(conn: &Connection, id: Option<i64>) -> Result<Option<Self>> {
        match id {
            Some(id) => Ok(Self::filter(conn, "id = ?1", [id], "id")?.into_iter().next()),
            None => Ok(None),
        }
    }

    pub fn get_by_uuid(conn: &Connection, uuid: &Uuid) -> Result<Self> {
        Self::filter(conn, "uuid = ?1", [uuid.to_string()], "id")?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(T::KIND, uuid))
    }

    /// Replace all stored columns of row `id`
    pub fn update(conn: &Connection, id: i64, data: T) -> Result<Self> {
        check_money_values(&data)?;
        let values = data.to_values();
        validate_values(T::FIELDS, &values)?;

        let assignments: Vec<String> = T::FIELDS
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ?{}", f.column, i + 2))
            .collect();
        let sql = format!("UPDATE {} SET {} WHERE id = ?1", T::TABLE, assignments.join(", "));

        let mut params = Vec::with_capacity(values.len() + 1);
        params.push(Value::Integer(id));
        params.extend(values);
        let changed = conn.execute(&sql, params_from_iter(params))?;
        if changed == 0 {
            return Err(Error::not_found(T::KIND, id));
        }

        Self::get(conn, id)
    }

    /// Write the in-memory values back to the row
    pub fn save(&mut self, conn: &Connection) -> Result<()>
    where
        T: Clone,
    {
        *self = Self::update(conn, self.id, self.data.clone())?;
        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let changed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", T::TABLE), [id])?;
        if changed == 0 {
            return Err(Error::not_found(T::KIND, id));
        }
        tracing::debug!(kind = T::KIND, id, "record deleted");
        Ok(())
    }

    pub fn all(conn: &Connection, order_by: &str) -> Result<Vec<Self>> {
        Self::filter(conn, "1 = 1", [], order_by)
    }

    /// Rows matching `clause`; clause and ordering are fixed strings, values go through `params`
    pub fn filter<P: Params>(
        conn: &Connection,
        clause: &str,
        params: P,
        order_by: &str,
    ) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT id, uuid, {} FROM {} WHERE {} ORDER BY {}",
            column_list(T::FIELDS),
            T::TABLE,
            clause,
            order_by
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(Record {
                id: row.get(0)?,
                uuid: read_uuid(row, 1)?,
                data: T::from_row(row, 2)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", T::TABLE), [], |row| row.get(0))?)
    }
}

// ============================================================================
// LINKS (display form of a referenced row)
// ============================================================================

/// Public identifier + short label of a referenced row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub uuid: Uuid,
    pub name: String,
}

impl Link {
    pub fn load(conn: &Connection, target: Target, id: Option<i64>) -> Result<Option<Link>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT uuid, {} FROM {} WHERE id = ?1",
            target.label_sql(),
            target.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map([id], |row| {
            Ok(Link {
                uuid: read_uuid(row, 0)?,
                name: row.get(1)?,
            })
        })?;

        Ok(rows.next().transpose()?)
    }

    pub fn of<T>(record: &Record<T>, name: impl Into<String>) -> Link {
        Link {
            uuid: record.uuid,
            name: name.into(),
        }
    }
}
