// 📬 Contact and identity records
//
// Addresses, phone numbers, emails, websites, and assumed names. Each can
// name an owner and associate any number of entities.

use crate::error::Result;
use crate::models::association::{
    Association, ADDRESS_OWNERS, ADDRESS_RESIDENTS, ASSUMED_NAME_ENTITIES, EMAIL_ENTITIES,
    PHONE_NUMBER_ENTITIES, WEBSITE_ENTITIES,
};
use crate::models::category::CategoryKind;
use crate::models::{Entity, Field, Record, Table, Target};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

// ============================================================================
// ADDRESS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub category_id: Option<i64>,
    pub building_number: String,
    pub street_name: String,
    pub unit_number: String,
    pub floor_number: String,
    pub city_name: String,
    pub state_name: String,
    pub county_name: String,
    pub zip_code: String,
    pub zip_code_extension: String,
    pub notes: String,
}

impl Address {
    /// "1100 Congress Ave, Austin, TX 78701"
    pub fn one_line(&self) -> String {
        let street = [&self.building_number, &self.street_name, &self.unit_number]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let zip = if self.zip_code_extension.is_empty() {
            self.zip_code.clone()
        } else {
            format!("{}-{}", self.zip_code, self.zip_code_extension)
        };
        let state_zip = format!("{} {}", self.state_name, zip).trim().to_string();

        [street, self.city_name.clone(), state_zip]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Table for Address {
    const TABLE: &'static str = "addresses";
    const KIND: &'static str = "address";
    const FIELDS: &'static [Field] = &[
        Field::category(CategoryKind::Address),
        Field::text("building_number", "Building number", 300),
        Field::text("street_name", "Street", 300),
        Field::text("unit_number", "Unit number", 300),
        Field::text("floor_number", "Floor number", 300),
        Field::text("city_name", "City", 300),
        Field::text("state_name", "State", 300),
        Field::text("county_name", "County", 300),
        Field::required_text("zip_code", "Zip code", 300),
        Field::text("zip_code_extension", "Zip code extension", 300),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.building_number.clone().into(),
            self.street_name.clone().into(),
            self.unit_number.clone().into(),
            self.floor_number.clone().into(),
            self.city_name.clone().into(),
            self.state_name.clone().into(),
            self.county_name.clone().into(),
            self.zip_code.clone().into(),
            self.zip_code_extension.clone().into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Address {
            category_id: row.get(offset)?,
            building_number: row.get(offset + 1)?,
            street_name: row.get(offset + 2)?,
            unit_number: row.get(offset + 3)?,
            floor_number: row.get(offset + 4)?,
            city_name: row.get(offset + 5)?,
            state_name: row.get(offset + 6)?,
            county_name: row.get(offset + 7)?,
            zip_code: row.get(offset + 8)?,
            zip_code_extension: row.get(offset + 9)?,
            notes: row.get(offset + 10)?,
        })
    }
}

impl Record<Address> {
    pub fn residents(&self, conn: &Connection) -> Result<Vec<Record<Entity>>> {
        ADDRESS_RESIDENTS.targets(conn, self.id, ENTITY_ORDER)
    }

    pub fn owners(&self, conn: &Connection) -> Result<Vec<Record<Entity>>> {
        ADDRESS_OWNERS.targets(conn, self.id, ENTITY_ORDER)
    }

    /// Addresses where the entity resides or which it owns
    pub fn for_entity(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        let clause = format!(
            "id IN (SELECT address_id FROM {} WHERE entity_id = ?1) \
             OR id IN (SELECT address_id FROM {} WHERE entity_id = ?1)",
            ADDRESS_RESIDENTS.table, ADDRESS_OWNERS.table
        );
        Self::filter(conn, &clause, [entity_id], "street_name, id")
    }
}

const ENTITY_ORDER: &str = "last_name, first_name, id";

// ============================================================================
// PHONE NUMBER, EMAIL, WEBSITE, ASSUMED NAME
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub country_code: String,
    pub area_code: String,
    pub number: String,
    pub notes: String,
    pub owner_id: Option<i64>,
}

impl PhoneNumber {
    /// "+1 (512) 555-0100"
    pub fn formatted(&self) -> String {
        let number = if self.number.len() == 7 && self.number.is_ascii() {
            format!("{}-{}", &self.number[..3], &self.number[3..])
        } else {
            self.number.clone()
        };
        let local = if self.area_code.is_empty() {
            number
        } else {
            format!("({}) {}", self.area_code, number)
        };
        if self.country_code.is_empty() {
            local
        } else {
            format!("+{} {}", self.country_code, local)
        }
    }
}

impl Table for PhoneNumber {
    const TABLE: &'static str = "phone_numbers";
    const KIND: &'static str = "phone number";
    const FIELDS: &'static [Field] = &[
        Field::text("country_code", "Country code", 2),
        Field::text("area_code", "Area code", 3),
        Field::text("number", "Number", 7),
        Field::notes(),
        Field::link("owner_id", "Owner", Target::Entity),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.country_code.clone().into(),
            self.area_code.clone().into(),
            self.number.clone().into(),
            self.notes.clone().into(),
            self.owner_id.into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(PhoneNumber {
            country_code: row.get(offset)?,
            area_code: row.get(offset + 1)?,
            number: row.get(offset + 2)?,
            notes: row.get(offset + 3)?,
            owner_id: row.get(offset + 4)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub address: String,
    pub owner_id: Option<i64>,
    pub notes: String,
}

impl Table for Email {
    const TABLE: &'static str = "emails";
    const KIND: &'static str = "email";
    const FIELDS: &'static [Field] = &[
        Field::required_text("address", "Address", 300),
        Field::link("owner_id", "Owner", Target::Entity),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.address.clone().into(),
            self.owner_id.into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Email {
            address: row.get(offset)?,
            owner_id: row.get(offset + 1)?,
            notes: row.get(offset + 2)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub address: String,
    pub owner_id: Option<i64>,
    pub notes: String,
}

impl Table for Website {
    const TABLE: &'static str = "websites";
    const KIND: &'static str = "website";
    const FIELDS: &'static [Field] = &[
        Field::required_text("address", "Address", 300),
        Field::link("owner_id", "Owner", Target::Entity),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.address.clone().into(),
            self.owner_id.into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Website {
            address: row.get(offset)?,
            owner_id: row.get(offset + 1)?,
            notes: row.get(offset + 2)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumedName {
    pub name: String,
    pub notes: String,
}

impl Table for AssumedName {
    const TABLE: &'static str = "assumed_names";
    const KIND: &'static str = "assumed name";
    const FIELDS: &'static [Field] = &[
        Field::required_text("name", "Name", 300),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![self.name.clone().into(), self.notes.clone().into()]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(AssumedName {
            name: row.get(offset)?,
            notes: row.get(offset + 1)?,
        })
    }
}

// ============================================================================
// ASSOCIATED ENTITIES
// ============================================================================

/// Contact records whose rows associate entities through one join table
pub trait HasAssociatedEntities: Table {
    const ENTITIES: Association;
    const LIST_ORDER: &'static str;
}

impl HasAssociatedEntities for PhoneNumber {
    const ENTITIES: Association = PHONE_NUMBER_ENTITIES;
    const LIST_ORDER: &'static str = "area_code, number, id";
}

impl HasAssociatedEntities for Email {
    const ENTITIES: Association = EMAIL_ENTITIES;
    const LIST_ORDER: &'static str = "address, id";
}

impl HasAssociatedEntities for Website {
    const ENTITIES: Association = WEBSITE_ENTITIES;
    const LIST_ORDER: &'static str = "address, id";
}

impl HasAssociatedEntities for AssumedName {
    const ENTITIES: Association = ASSUMED_NAME_ENTITIES;
    const LIST_ORDER: &'static str = "name, id";
}

impl<T: HasAssociatedEntities> Record<T> {
    pub fn associated_entities(&self, conn: &Connection) -> Result<Vec<Record<Entity>>> {
        T::ENTITIES.targets(conn, self.id, ENTITY_ORDER)
    }

    pub fn set_associated_entities(&self, conn: &Connection, entity_ids: &[i64]) -> Result<()> {
        T::ENTITIES.set(conn, self.id, entity_ids)
    }

    /// Records associated with an entity
    pub fn associated_with(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        T::ENTITIES.owners(conn, entity_id, T::LIST_ORDER)
    }
}

/// Owned contact records (every contact type except addresses and assumed names)
pub fn owned_by<T: Table>(conn: &Connection, entity_id: i64) -> Result<Vec<Record<T>>> {
    Record::<T>::filter(conn, "owner_id = ?1", [entity_id], "id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::open_in_memory;

    fn person(conn: &Connection, last_name: &str) -> Record<Entity> {
        Record::create(conn, Entity::named(None, last_name)).unwrap()
    }

    #[test]
    fn test_address_creation() {
        let conn = open_in_memory().unwrap();
        let resident = person(&conn, "test1");
        let owner = person(&conn, "test2");

        let address = Record::create(
            &conn,
            Address {
                building_number: "1100".to_string(),
                street_name: "Congress Ave".to_string(),
                city_name: "Austin".to_string(),
                state_name: "TX".to_string(),
                zip_code: "78701".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        ADDRESS_RESIDENTS.add(&conn, address.id, resident.id).unwrap();
        ADDRESS_OWNERS.add(&conn, address.id, owner.id).unwrap();

        let retrieved = Record::<Address>::get_by_uuid(&conn, &address.uuid).unwrap();
        assert_eq!(retrieved.one_line(), "1100 Congress Ave, Austin, TX 78701");
        assert_eq!(retrieved.residents(&conn).unwrap()[0].id, resident.id);
        assert_eq!(retrieved.owners(&conn).unwrap()[0].id, owner.id);
        assert_eq!(Record::<Address>::for_entity(&conn, owner.id).unwrap().len(), 1);
        assert_eq!(Record::<Address>::for_entity(&conn, resident.id).unwrap().len(), 1);
    }

    #[test]
    fn test_address_requires_zip_code() {
        let conn = open_in_memory().unwrap();
        assert!(Record::create(&conn, Address::default()).is_err());
    }

    #[test]
    fn test_phone_number_associations() {
        let conn = open_in_memory().unwrap();
        let owner = person(&conn, "test1");
        let other = person(&conn, "test2");

        let phone = Record::create(
            &conn,
            PhoneNumber {
                country_code: "1".to_string(),
                area_code: "512".to_string(),
                number: "5550100".to_string(),
                owner_id: Some(owner.id),
                ..Default::default()
            },
        )
        .unwrap();
        phone.set_associated_entities(&conn, &[owner.id, other.id]).unwrap();

        assert_eq!(phone.formatted(), "+1 (512) 555-0100");
        assert_eq!(phone.associated_entities(&conn).unwrap().len(), 2);
        assert_eq!(Record::<PhoneNumber>::associated_with(&conn, other.id).unwrap()[0].id, phone.id);
        assert_eq!(owned_by::<PhoneNumber>(&conn, owner.id).unwrap().len(), 1);

        // Removing an entity drops only its association rows
        Record::<Entity>::delete(&conn, other.id).unwrap();
        assert_eq!(phone.associated_entities(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_phone_number_length_limits() {
        let conn = open_in_memory().unwrap();
        let phone = PhoneNumber {
            area_code: "5120".to_string(),
            ..Default::default()
        };
        assert!(Record::create(&conn, phone).is_err());
    }

    #[test]
    fn test_email_and_website_unique() {
        let conn = open_in_memory().unwrap();
        let email = Email {
            address: "jane@example.com".to_string(),
            ..Default::default()
        };
        Record::create(&conn, email.clone()).unwrap();
        assert!(Record::create(&conn, email).unwrap_err().is_constraint_violation());

        let website = Website {
            address: "https://example.com".to_string(),
            ..Default::default()
        };
        Record::create(&conn, website.clone()).unwrap();
        assert!(Record::create(&conn, website).unwrap_err().is_constraint_violation());
    }

    #[test]
    fn test_assumed_name_associations() {
        let conn = open_in_memory().unwrap();
        let company = person(&conn, "Acme Holdings LLC");
        let dba = Record::create(
            &conn,
            AssumedName {
                name: "Acme".to_string(),
                notes: String::new(),
            },
        )
        .unwrap();
        dba.set_associated_entities(&conn, &[company.id]).unwrap();

        assert_eq!(dba.associated_entities(&conn).unwrap()[0].last_name, "Acme Holdings LLC");
        assert_eq!(Record::<AssumedName>::associated_with(&conn, company.id).unwrap()[0].name, "Acme");

        Record::<AssumedName>::delete(&conn, dba.id).unwrap();
        assert!(Record::<AssumedName>::associated_with(&conn, company.id).unwrap().is_empty());
    }
}
