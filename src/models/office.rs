// 🏛️ Offices and the people who held them

use crate::error::Result;
use crate::models::{Field, Record, Table, Target};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub government_entity_id: Option<i64>,
    pub name: String,
    pub holder_entity_id: Option<i64>,
    pub notes: String,
}

impl Table for Office {
    const TABLE: &'static str = "offices";
    const KIND: &'static str = "office";
    const FIELDS: &'static [Field] = &[
        Field::link("government_entity_id", "Government", Target::Entity),
        Field::required_text("name", "Title", 300),
        Field::link("holder_entity_id", "Current office holder", Target::Entity),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.government_entity_id.into(),
            self.name.clone().into(),
            self.holder_entity_id.into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Office {
            government_entity_id: row.get(offset)?,
            name: row.get(offset + 1)?,
            holder_entity_id: row.get(offset + 2)?,
            notes: row.get(offset + 3)?,
        })
    }
}

impl Record<Office> {
    /// Offices currently held by an entity
    pub fn held_by(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "holder_entity_id = ?1", [entity_id], "name, id")
    }

    /// Offices belonging to a government entity
    pub fn of_government(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "government_entity_id = ?1", [entity_id], "name, id")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormerOfficeHolder {
    pub office_id: Option<i64>,
    pub entity_id: Option<i64>,
}

impl Table for FormerOfficeHolder {
    const TABLE: &'static str = "former_office_holders";
    const KIND: &'static str = "former office holder";
    const FIELDS: &'static [Field] = &[
        Field::link("office_id", "Office", Target::Office),
        Field::link("entity_id", "Former holder", Target::Entity),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![self.office_id.into(), self.entity_id.into()]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(FormerOfficeHolder {
            office_id: row.get(offset)?,
            entity_id: row.get(offset + 1)?,
        })
    }
}

impl Record<FormerOfficeHolder> {
    pub fn for_office(conn: &Connection, office_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "office_id = ?1", [office_id], "id")
    }

    pub fn for_entity(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "entity_id = ?1", [entity_id], "id")
    }
}
