// 👤 Entities - people, committees, corporations, governments
//
// An entity's kind is data (its category), not a type. Industries group
// entities by line of business; external ids record agency-assigned numbers;
// relationships are directed parent -> child links between two entities.

use crate::error::Result;
use crate::models::category::CategoryKind;
use crate::models::{Field, Record, Table, Target};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

// ============================================================================
// INDUSTRY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Industry {
    pub name: String,
    pub sector_id: Option<i64>,
}

impl Table for Industry {
    const TABLE: &'static str = "industries";
    const KIND: &'static str = "industry";
    const FIELDS: &'static [Field] = &[
        Field::required_text("name", "Name", 300),
        Field::category(CategoryKind::IndustrySector),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![self.name.clone().into(), self.sector_id.into()]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Industry {
            name: row.get(offset)?,
            sector_id: row.get(offset + 1)?,
        })
    }
}

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub category_id: Option<i64>,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub prefix: String,
    pub suffix: String,
    pub nickname: String,
    pub occupation: String,
    pub industry_id: Option<i64>,
    pub notes: String,
    pub opencorporates_link: String,
    pub littlesis_link: String,
}

impl Entity {
    /// Entity with only a (last) name, the shape organizations take
    pub fn named(category_id: Option<i64>, last_name: &str) -> Self {
        Entity {
            category_id,
            last_name: last_name.to_string(),
            ..Default::default()
        }
    }

    /// "Last, First Middle Suffix"
    pub fn sort_name(&self) -> String {
        format!(
            "{}, {} {} {}",
            self.last_name, self.first_name, self.middle_name, self.suffix
        )
    }

    /// "First Last", or just the last name for organizations
    pub fn short_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Every non-empty name part in reading order
    pub fn full_name(&self) -> String {
        [
            &self.prefix,
            &self.first_name,
            &self.middle_name,
            &self.last_name,
            &self.suffix,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl Table for Entity {
    const TABLE: &'static str = "entities";
    const KIND: &'static str = "entity";
    const FIELDS: &'static [Field] = &[
        Field::category(CategoryKind::Entity),
        Field::text("first_name", "First name", 100),
        Field::text("middle_name", "Middle name", 100),
        Field::required_text("last_name", "Last name", 300),
        Field::text("prefix", "Prefix", 100),
        Field::text("suffix", "Suffix", 100),
        Field::text("nickname", "Nickname", 100),
        Field::text("occupation", "Occupation", 100),
        Field::link("industry_id", "Industry", Target::Industry),
        Field::notes(),
        Field::url("opencorporates_link", "OpenCorporates link", 300),
        Field::text("littlesis_link", "LittleSis link", 300),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.first_name.clone().into(),
            self.middle_name.clone().into(),
            self.last_name.clone().into(),
            self.prefix.clone().into(),
            self.suffix.clone().into(),
            self.nickname.clone().into(),
            self.occupation.clone().into(),
            self.industry_id.into(),
            self.notes.clone().into(),
            self.opencorporates_link.clone().into(),
            self.littlesis_link.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Entity {
            category_id: row.get(offset)?,
            first_name: row.get(offset + 1)?,
            middle_name: row.get(offset + 2)?,
            last_name: row.get(offset + 3)?,
            prefix: row.get(offset + 4)?,
            suffix: row.get(offset + 5)?,
            nickname: row.get(offset + 6)?,
            occupation: row.get(offset + 7)?,
            industry_id: row.get(offset + 8)?,
            notes: row.get(offset + 9)?,
            opencorporates_link: row.get(offset + 10)?,
            littlesis_link: row.get(offset + 11)?,
        })
    }
}

impl Record<Entity> {
    /// Find an entity by exact last name, creating an uncategorized one when missing
    pub fn find_or_create_named(conn: &Connection, last_name: &str) -> Result<Self> {
        let existing = Self::filter(conn, "last_name = ?1 AND first_name = ''", [last_name], "id")?;
        match existing.into_iter().next() {
            Some(entity) => Ok(entity),
            None => Self::create(conn, Entity::named(None, last_name)),
        }
    }
}

// ============================================================================
// EXTERNAL ID (IRS, TEC, FEC ... numbers)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalId {
    /// The reporting agency that assigned the number
    pub parent_entity_id: Option<i64>,
    /// The organization the number identifies
    pub child_entity_id: Option<i64>,
    pub number: String,
    pub notes: String,
}

impl Table for ExternalId {
    const TABLE: &'static str = "external_ids";
    const KIND: &'static str = "external id";
    const FIELDS: &'static [Field] = &[
        Field::link("parent_entity_id", "Reporting agency", Target::Entity),
        Field::link("child_entity_id", "Organization", Target::Entity),
        Field::text("number", "Agency internal ID number", 300),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.parent_entity_id.into(),
            self.child_entity_id.into(),
            self.number.clone().into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(ExternalId {
            parent_entity_id: row.get(offset)?,
            child_entity_id: row.get(offset + 1)?,
            number: row.get(offset + 2)?,
            notes: row.get(offset + 3)?,
        })
    }
}

// ============================================================================
// RELATIONSHIP
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub category_id: Option<i64>,
    pub parent_entity_id: i64,
    pub child_entity_id: i64,
    pub notes: String,
}

impl Table for Relationship {
    const TABLE: &'static str = "relationships";
    const KIND: &'static str = "relationship";
    const FIELDS: &'static [Field] = &[
        Field::category(CategoryKind::Relationship),
        Field::required_link("parent_entity_id", "Member 1", Target::Entity),
        Field::required_link("child_entity_id", "Member 2", Target::Entity),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.parent_entity_id.into(),
            self.child_entity_id.into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Relationship {
            category_id: row.get(offset)?,
            parent_entity_id: row.get(offset + 1)?,
            child_entity_id: row.get(offset + 2)?,
            notes: row.get(offset + 3)?,
        })
    }
}

impl Record<Relationship> {
    /// Relationships in which the entity is either member
    pub fn involving(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(
            conn,
            "parent_entity_id = ?1 OR child_entity_id = ?1",
            [entity_id],
            "id",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::category::Category;
    use crate::schema::open_in_memory;

    fn sector(conn: &Connection, name: &str) -> Category {
        Category::create(conn, CategoryKind::IndustrySector, name).unwrap()
    }

    #[test]
    fn test_industry_creation() {
        let conn = open_in_memory().unwrap();
        let construction = sector(&conn, "Construction");
        let industry = Record::create(
            &conn,
            Industry {
                name: "Home Builders".to_string(),
                sector_id: Some(construction.id),
            },
        )
        .unwrap();

        let retrieved = Record::<Industry>::get(&conn, industry.id).unwrap();
        assert_eq!(retrieved.name, "Home Builders");
        assert_eq!(
            Category::name_of(&conn, CategoryKind::IndustrySector, retrieved.sector_id).unwrap(),
            Some("Construction".to_string())
        );
    }

    #[test]
    fn test_industry_duplicate() {
        let conn = open_in_memory().unwrap();
        let industry = Industry {
            name: "Home Builders".to_string(),
            sector_id: None,
        };
        Record::create(&conn, industry.clone()).unwrap();

        assert!(Record::create(&conn, industry).unwrap_err().is_constraint_violation());
    }

    #[test]
    fn test_industry_delete_keeps_sector() {
        let conn = open_in_memory().unwrap();
        let construction = sector(&conn, "Construction");
        let concrete = Record::create(
            &conn,
            Industry {
                name: "Concrete".to_string(),
                sector_id: Some(construction.id),
            },
        )
        .unwrap();

        Record::<Industry>::delete(&conn, concrete.id).unwrap();

        assert!(Record::<Industry>::get(&conn, concrete.id).unwrap_err().is_not_found());
        assert_eq!(
            Category::get(&conn, CategoryKind::IndustrySector, construction.id).unwrap().name,
            "Construction"
        );
    }

    #[test]
    fn test_sector_delete_nulls_industry_link() {
        let conn = open_in_memory().unwrap();
        let media = sector(&conn, "Media");
        let tv = Record::create(
            &conn,
            Industry {
                name: "Television".to_string(),
                sector_id: Some(media.id),
            },
        )
        .unwrap();

        Category::delete(&conn, CategoryKind::IndustrySector, media.id).unwrap();

        assert_eq!(Record::<Industry>::get(&conn, tv.id).unwrap().sector_id, None);
    }

    #[test]
    fn test_entity_creation() {
        let conn = open_in_memory().unwrap();
        let individual = Category::create(&conn, CategoryKind::Entity, "Individual").unwrap();
        let industry = Record::create(
            &conn,
            Industry {
                name: "Home Building".to_string(),
                sector_id: None,
            },
        )
        .unwrap();

        let entity = Record::create(
            &conn,
            Entity {
                category_id: Some(individual.id),
                first_name: "John".to_string(),
                middle_name: "Smith".to_string(),
                last_name: "Doe".to_string(),
                prefix: "Mr".to_string(),
                suffix: "Sr".to_string(),
                nickname: "Jo".to_string(),
                occupation: "Writer".to_string(),
                industry_id: Some(industry.id),
                notes: "Some placeholder notes".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let retrieved = Record::<Entity>::get_by_uuid(&conn, &entity.uuid).unwrap();
        assert_eq!(retrieved.id, entity.id);
        assert_eq!(retrieved.category_id, Some(individual.id));
        assert_eq!(retrieved.first_name, "John");
        assert_eq!(retrieved.middle_name, "Smith");
        assert_eq!(retrieved.last_name, "Doe");
        assert_eq!(retrieved.prefix, "Mr");
        assert_eq!(retrieved.suffix, "Sr");
        assert_eq!(retrieved.nickname, "Jo");
        assert_eq!(retrieved.occupation, "Writer");
        assert_eq!(retrieved.industry_id, Some(industry.id));
        assert_eq!(retrieved.notes, "Some placeholder notes");

        assert_eq!(retrieved.sort_name(), "Doe, John Smith Sr");
        assert_eq!(retrieved.short_name(), "John Doe");
        assert_eq!(retrieved.full_name(), "Mr John Smith Doe Sr");
    }

    #[test]
    fn test_entity_requires_last_name() {
        let conn = open_in_memory().unwrap();
        let err = Record::create(&conn, Entity::named(None, "")).unwrap_err();
        assert!(matches!(err, Error::Validation { field, .. } if field == "last_name"));
    }

    #[test]
    fn test_entity_rejects_bad_opencorporates_link() {
        let conn = open_in_memory().unwrap();
        let mut entity = Entity::named(None, "Acme LLC");
        entity.opencorporates_link = "opencorporates.com/companies/x".to_string();
        assert!(Record::create(&conn, entity).is_err());
    }

    #[test]
    fn test_entity_update() {
        let conn = open_in_memory().unwrap();
        let mut entity = Record::create(&conn, Entity::named(None, "Doe")).unwrap();

        entity.data.first_name = "Jane".to_string();
        entity.save(&conn).unwrap();

        let retrieved = Record::<Entity>::get(&conn, entity.id).unwrap();
        assert_eq!(retrieved.short_name(), "Jane Doe");
        assert_eq!(retrieved.uuid, entity.uuid);
    }

    #[test]
    fn test_find_or_create_named() {
        let conn = open_in_memory().unwrap();
        let first = Record::<Entity>::find_or_create_named(&conn, "Acme PAC").unwrap();
        let second = Record::<Entity>::find_or_create_named(&conn, "Acme PAC").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(Record::<Entity>::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_external_id_creation() {
        let conn = open_in_memory().unwrap();
        let agency = Category::create(&conn, CategoryKind::Entity, "Reporting Agency").unwrap();
        let individual = Category::create(&conn, CategoryKind::Entity, "Individual").unwrap();
        let tec = Record::create(&conn, Entity::named(Some(agency.id), "Texas Ethics Commission")).unwrap();
        let person = Record::create(&conn, Entity::named(Some(individual.id), "test1")).unwrap();

        let external = Record::create(
            &conn,
            ExternalId {
                parent_entity_id: Some(tec.id),
                child_entity_id: Some(person.id),
                number: "123456".to_string(),
                notes: String::new(),
            },
        )
        .unwrap();

        let retrieved = Record::<ExternalId>::get(&conn, external.id).unwrap();
        let parent = Record::<Entity>::find(&conn, retrieved.parent_entity_id).unwrap().unwrap();
        let child = Record::<Entity>::find(&conn, retrieved.child_entity_id).unwrap().unwrap();
        assert_eq!(parent.last_name, "Texas Ethics Commission");
        assert_eq!(child.last_name, "test1");
        assert_eq!(retrieved.number, "123456");
    }

    #[test]
    fn test_relationship_creation() {
        let conn = open_in_memory().unwrap();
        let family = Category::create(&conn, CategoryKind::Relationship, "Family").unwrap();
        let e1 = Record::create(&conn, Entity::named(None, "test1")).unwrap();
        let e2 = Record::create(&conn, Entity::named(None, "test2")).unwrap();

        let relationship = Record::create(
            &conn,
            Relationship {
                category_id: Some(family.id),
                parent_entity_id: e1.id,
                child_entity_id: e2.id,
                notes: "Testing notes".to_string(),
            },
        )
        .unwrap();

        let retrieved = Record::<Relationship>::get(&conn, relationship.id).unwrap();
        assert_eq!(
            Category::name_of(&conn, CategoryKind::Relationship, retrieved.category_id).unwrap(),
            Some("Family".to_string())
        );
        assert_eq!(retrieved.parent_entity_id, e1.id);
        assert_eq!(retrieved.child_entity_id, e2.id);
        assert_eq!(retrieved.notes, "Testing notes");

        assert_eq!(Record::<Relationship>::involving(&conn, e2.id).unwrap().len(), 1);
    }

    #[test]
    fn test_relationship_requires_existing_members() {
        let conn = open_in_memory().unwrap();
        let e1 = Record::create(&conn, Entity::named(None, "test1")).unwrap();

        let err = Record::create(
            &conn,
            Relationship {
                category_id: None,
                parent_entity_id: e1.id,
                child_entity_id: 9999,
                notes: String::new(),
            },
        )
        .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_relationship_cascades_with_member() {
        let conn = open_in_memory().unwrap();
        let e1 = Record::create(&conn, Entity::named(None, "test1")).unwrap();
        let e2 = Record::create(&conn, Entity::named(None, "test2")).unwrap();
        let relationship = Record::create(
            &conn,
            Relationship {
                category_id: None,
                parent_entity_id: e1.id,
                child_entity_id: e2.id,
                notes: String::new(),
            },
        )
        .unwrap();

        Record::<Entity>::delete(&conn, e1.id).unwrap();

        assert!(Record::<Relationship>::get(&conn, relationship.id).unwrap_err().is_not_found());
        assert!(Record::<Entity>::get(&conn, e2.id).is_ok());
    }
}
