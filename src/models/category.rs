// 🏷️ Category tables - one shape, eight tables
//
// Every category is a unique name with a public UUID. The kind selects the
// table; the listings and admin pickers look categories up by name.

use crate::error::{Error, Result};
use crate::models::read_uuid;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CATEGORY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    Entity,
    IndustrySector,
    Relationship,
    Campaign,
    Election,
    Document,
    Transaction,
    Address,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 8] = [
        CategoryKind::Entity,
        CategoryKind::IndustrySector,
        CategoryKind::Relationship,
        CategoryKind::Campaign,
        CategoryKind::Election,
        CategoryKind::Document,
        CategoryKind::Transaction,
        CategoryKind::Address,
    ];

    pub const fn table(&self) -> &'static str {
        match self {
            CategoryKind::Entity => "entity_categories",
            CategoryKind::IndustrySector => "industry_sectors",
            CategoryKind::Relationship => "relationship_categories",
            CategoryKind::Campaign => "campaign_categories",
            CategoryKind::Election => "election_categories",
            CategoryKind::Document => "document_categories",
            CategoryKind::Transaction => "transaction_categories",
            CategoryKind::Address => "address_categories",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Entity => "entity category",
            CategoryKind::IndustrySector => "industry sector",
            CategoryKind::Relationship => "relationship category",
            CategoryKind::Campaign => "campaign category",
            CategoryKind::Election => "election category",
            CategoryKind::Document => "document category",
            CategoryKind::Transaction => "transaction category",
            CategoryKind::Address => "address category",
        }
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
}

/// Longest category name accepted
pub const NAME_MAX_LEN: usize = 300;

fn category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        uuid: read_uuid(row, 1)?,
        name: row.get(2)?,
    })
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "This field is required."));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(Error::validation(
            "name",
            format!("Ensure this value has at most {NAME_MAX_LEN} characters."),
        ));
    }
    Ok(())
}

impl Category {
    /// Insert a new category; a duplicate name is a constraint violation
    pub fn create(conn: &Connection, kind: CategoryKind, name: &str) -> Result<Category> {
        check_name(name)?;
        let uuid = Uuid::new_v4();
        conn.execute(
            &format!("INSERT INTO {} (uuid, name) VALUES (?1, ?2)", kind.table()),
            params![uuid.to_string(), name],
        )?;

        Ok(Category {
            id: conn.last_insert_rowid(),
            uuid,
            name: name.to_string(),
        })
    }

    pub fn get(conn: &Connection, kind: CategoryKind, id: i64) -> Result<Category> {
        conn.query_row(
            &format!("SELECT id, uuid, name FROM {} WHERE id = ?1", kind.table()),
            [id],
            category_row,
        )
        .optional()?
        .ok_or_else(|| Error::not_found(kind.as_str(), id))
    }

    pub fn get_by_uuid(conn: &Connection, kind: CategoryKind, uuid: &Uuid) -> Result<Category> {
        conn.query_row(
            &format!("SELECT id, uuid, name FROM {} WHERE uuid = ?1", kind.table()),
            [uuid.to_string()],
            category_row,
        )
        .optional()?
        .ok_or_else(|| Error::not_found(kind.as_str(), uuid))
    }

    /// Exact (case-sensitive) name lookup
    pub fn find_by_name(conn: &Connection, kind: CategoryKind, name: &str) -> Result<Option<Category>> {
        Ok(conn
            .query_row(
                &format!("SELECT id, uuid, name FROM {} WHERE name = ?1", kind.table()),
                [name],
                category_row,
            )
            .optional()?)
    }

    pub fn get_or_create(conn: &Connection, kind: CategoryKind, name: &str) -> Result<Category> {
        match Self::find_by_name(conn, kind, name)? {
            Some(category) => Ok(category),
            None => Self::create(conn, kind, name),
        }
    }

    /// Name of an optional category reference
    pub fn name_of(conn: &Connection, kind: CategoryKind, id: Option<i64>) -> Result<Option<String>> {
        match id {
            Some(id) => Ok(conn
                .query_row(
                    &format!("SELECT name FROM {} WHERE id = ?1", kind.table()),
                    [id],
                    |row| row.get(0),
                )
                .optional()?),
            None => Ok(None),
        }
    }

    pub fn list(conn: &Connection, kind: CategoryKind) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, uuid, name FROM {} ORDER BY name",
            kind.table()
        ))?;
        let categories = stmt
            .query_map([], category_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub fn rename(conn: &Connection, kind: CategoryKind, id: i64, name: &str) -> Result<Category> {
        check_name(name)?;
        let changed = conn.execute(
            &format!("UPDATE {} SET name = ?2 WHERE id = ?1", kind.table()),
            params![id, name],
        )?;
        if changed == 0 {
            return Err(Error::not_found(kind.as_str(), id));
        }
        Self::get(conn, kind, id)
    }

    /// Delete a category; rows pointing at it keep existing with no category
    pub fn delete(conn: &Connection, kind: CategoryKind, id: i64) -> Result<()> {
        let changed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), [id])?;
        if changed == 0 {
            return Err(Error::not_found(kind.as_str(), id));
        }
        Ok(())
    }
}
