// Many-to-many association tables
//
// Each association links an owner row to a target row through a join table
// with a composite primary key; both sides cascade on delete.

use crate::error::Result;
use crate::models::{Record, Table};
use rusqlite::{params, Connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
}

/// Campaigns appearing on an election's ballot
pub const ELECTION_CAMPAIGNS: Association = Association {
    table: "election_campaigns",
    owner_column: "election_id",
    target_column: "campaign_id",
};

pub const ADDRESS_RESIDENTS: Association = Association {
    table: "address_residents",
    owner_column: "address_id",
    target_column: "entity_id",
};

pub const ADDRESS_OWNERS: Association = Association {
    table: "address_owners",
    owner_column: "address_id",
    target_column: "entity_id",
};

pub const PHONE_NUMBER_ENTITIES: Association = Association {
    table: "phone_number_entities",
    owner_column: "phone_number_id",
    target_column: "entity_id",
};

pub const EMAIL_ENTITIES: Association = Association {
    table: "email_entities",
    owner_column: "email_id",
    target_column: "entity_id",
};

pub const WEBSITE_ENTITIES: Association = Association {
    table: "website_entities",
    owner_column: "website_id",
    target_column: "entity_id",
};

pub const ASSUMED_NAME_ENTITIES: Association = Association {
    table: "assumed_name_entities",
    owner_column: "assumed_name_id",
    target_column: "entity_id",
};

impl Association {
    /// Link owner and target; linking twice is a no-op
    pub fn add(&self, conn: &Connection, owner_id: i64, target_id: i64) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
                self.table, self.owner_column, self.target_column
            ),
            params![owner_id, target_id],
        )?;
        Ok(())
    }

    pub fn remove(&self, conn: &Connection, owner_id: i64, target_id: i64) -> Result<()> {
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
                self.table, self.owner_column, self.target_column
            ),
            params![owner_id, target_id],
        )?;
        Ok(())
    }

    /// Replace the owner's whole target set
    pub fn set(&self, conn: &Connection, owner_id: i64, target_ids: &[i64]) -> Result<()> {
        conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", self.table, self.owner_column),
            [owner_id],
        )?;
        for target_id in target_ids {
            self.add(conn, owner_id, *target_id)?;
        }
        Ok(())
    }

    pub fn target_ids(&self, conn: &Connection, owner_id: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY {}",
            self.target_column, self.table, self.owner_column, self.target_column
        ))?;
        let ids = stmt
            .query_map([owner_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    /// Target rows linked to an owner
    pub fn targets<T: Table>(&self, conn: &Connection, owner_id: i64, order_by: &str) -> Result<Vec<Record<T>>> {
        let clause = format!(
            "id IN (SELECT {} FROM {} WHERE {} = ?1)",
            self.target_column, self.table, self.owner_column
        );
        Record::<T>::filter(conn, &clause, [owner_id], order_by)
    }

    /// Owner rows linked to a target (the reverse lookup)
    pub fn owners<T: Table>(&self, conn: &Connection, target_id: i64, order_by: &str) -> Result<Vec<Record<T>>> {
        let clause = format!(
            "id IN (SELECT {} FROM {} WHERE {} = ?1)",
            self.owner_column, self.table, self.target_column
        );
        Record::<T>::filter(conn, &clause, [target_id], order_by)
    }
}
