// 🗳️ Elections and campaigns
//
// A campaign names its primary election directly; the ballot of an election
// is the many-to-many `election_campaigns` association.

use crate::error::Result;
use crate::models::association::ELECTION_CAMPAIGNS;
use crate::models::category::CategoryKind;
use crate::models::{date_value, Field, Record, Table, Target};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

// ============================================================================
// ELECTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    pub category_id: Option<i64>,
    pub government_entity_id: Option<i64>,
    pub date: NaiveDate,
    pub notes: String,
}

impl Election {
    pub fn on(date: NaiveDate) -> Self {
        Election {
            category_id: None,
            government_entity_id: None,
            date,
            notes: String::new(),
        }
    }
}

impl Table for Election {
    const TABLE: &'static str = "elections";
    const KIND: &'static str = "election";
    const FIELDS: &'static [Field] = &[
        Field::category(CategoryKind::Election),
        Field::link("government_entity_id", "Government juridiction", Target::Entity),
        Field::date("date", "Date", true),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.government_entity_id.into(),
            date_value(self.date),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Election {
            category_id: row.get(offset)?,
            government_entity_id: row.get(offset + 1)?,
            date: row.get(offset + 2)?,
            notes: row.get(offset + 3)?,
        })
    }
}

impl Record<Election> {
    /// Campaigns on this election's ballot
    pub fn campaigns(&self, conn: &Connection) -> Result<Vec<Record<Campaign>>> {
        ELECTION_CAMPAIGNS.targets(conn, self.id, "name, id")
    }

    pub fn set_campaigns(&self, conn: &Connection, campaign_ids: &[i64]) -> Result<()> {
        ELECTION_CAMPAIGNS.set(conn, self.id, campaign_ids)
    }

    pub fn of_government(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "government_entity_id = ?1", [entity_id], "date DESC, id")
    }
}

// ============================================================================
// CAMPAIGN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub category_id: Option<i64>,
    pub name: String,
    pub registration_date: NaiveDate,
    pub election_id: Option<i64>,
    pub candidate_entity_id: Option<i64>,
    pub treasurer_entity_id: Option<i64>,
    pub committee_entity_id: Option<i64>,
    pub office_sought_id: Option<i64>,
    pub notes: String,
}

impl Campaign {
    pub fn new(name: &str, registration_date: NaiveDate) -> Self {
        Campaign {
            category_id: None,
            name: name.to_string(),
            registration_date,
            election_id: None,
            candidate_entity_id: None,
            treasurer_entity_id: None,
            committee_entity_id: None,
            office_sought_id: None,
            notes: String::new(),
        }
    }
}

impl Table for Campaign {
    const TABLE: &'static str = "campaigns";
    const KIND: &'static str = "campaign";
    const FIELDS: &'static [Field] = &[
        Field::category(CategoryKind::Campaign),
        Field::required_text("name", "Name", 1000),
        Field::date("registration_date", "Registration date", true),
        Field::link("election_id", "Election", Target::Election),
        Field::link("candidate_entity_id", "Candidate", Target::Entity),
        Field::link("treasurer_entity_id", "Treasurer", Target::Entity),
        Field::link("committee_entity_id", "Committee", Target::Entity),
        Field::link("office_sought_id", "Office sought", Target::Office),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.name.clone().into(),
            date_value(self.registration_date),
            self.election_id.into(),
            self.candidate_entity_id.into(),
            self.treasurer_entity_id.into(),
            self.committee_entity_id.into(),
            self.office_sought_id.into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Campaign {
            category_id: row.get(offset)?,
            name: row.get(offset + 1)?,
            registration_date: row.get(offset + 2)?,
            election_id: row.get(offset + 3)?,
            candidate_entity_id: row.get(offset + 4)?,
            treasurer_entity_id: row.get(offset + 5)?,
            committee_entity_id: row.get(offset + 6)?,
            office_sought_id: row.get(offset + 7)?,
            notes: row.get(offset + 8)?,
        })
    }
}

impl Record<Campaign> {
    /// Elections whose ballot lists this campaign (reverse of `Election::campaigns`)
    pub fn elections_for_campaign(&self, conn: &Connection) -> Result<Vec<Record<Election>>> {
        ELECTION_CAMPAIGNS.owners(conn, self.id, "date DESC, id")
    }

    /// Campaigns in which the entity is candidate, treasurer, or committee
    pub fn involving(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(
            conn,
            "candidate_entity_id = ?1 OR treasurer_entity_id = ?1 OR committee_entity_id = ?1",
            [entity_id],
            "registration_date DESC, id",
        )
    }

    pub fn for_office(conn: &Connection, office_id: i64) -> Result<Vec<Self>> {
        Self::filter(conn, "office_sought_id = ?1", [office_id], "registration_date DESC, id")
    }

    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        Ok(Self::filter(conn, "name = ?1", [name], "id")?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Entity, Office};
    use crate::schema::open_in_memory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_election_creation() {
        let conn = open_in_memory().unwrap();
        let general = Category::create(&conn, CategoryKind::Election, "General").unwrap();
        let city = Record::create(&conn, Entity::named(None, "City of Austin")).unwrap();

        let election = Record::create(
            &conn,
            Election {
                category_id: Some(general.id),
                government_entity_id: Some(city.id),
                date: date(2023, 1, 1),
                notes: "Testing notes".to_string(),
            },
        )
        .unwrap();

        let retrieved = Record::<Election>::get_by_uuid(&conn, &election.uuid).unwrap();
        assert_eq!(retrieved.date, date(2023, 1, 1));
        assert_eq!(retrieved.category_id, Some(general.id));
        assert_eq!(Record::<Election>::of_government(&conn, city.id).unwrap().len(), 1);
    }

    #[test]
    fn test_campaign_creation() {
        let conn = open_in_memory().unwrap();
        let candidate_category = Category::create(&conn, CategoryKind::Campaign, "Candidate").unwrap();
        let candidate = Record::create(&conn, Entity::named(None, "Doe")).unwrap();
        let office = Record::create(
            &conn,
            Office {
                name: "Mayor".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let election = Record::create(&conn, Election::on(date(2023, 5, 6))).unwrap();

        let mut campaign = Campaign::new("Doe for Mayor", date(2023, 1, 1));
        campaign.category_id = Some(candidate_category.id);
        campaign.election_id = Some(election.id);
        campaign.candidate_entity_id = Some(candidate.id);
        campaign.office_sought_id = Some(office.id);
        let campaign = Record::create(&conn, campaign).unwrap();

        let retrieved = Record::<Campaign>::get(&conn, campaign.id).unwrap();
        assert_eq!(retrieved.name, "Doe for Mayor");
        assert_eq!(retrieved.registration_date, date(2023, 1, 1));
        assert_eq!(retrieved.election_id, Some(election.id));
        assert_eq!(Record::<Campaign>::involving(&conn, candidate.id).unwrap().len(), 1);
        assert_eq!(Record::<Campaign>::for_office(&conn, office.id).unwrap().len(), 1);
        assert_eq!(
            Record::<Campaign>::find_by_name(&conn, "Doe for Mayor").unwrap().map(|c| c.id),
            Some(campaign.id)
        );
    }

    #[test]
    fn test_election_campaigns_both_directions() {
        let conn = open_in_memory().unwrap();
        let primary = Record::create(&conn, Election::on(date(2023, 3, 1))).unwrap();
        let runoff = Record::create(&conn, Election::on(date(2023, 4, 6))).unwrap();
        let a = Record::create(&conn, Campaign::new("A", date(2023, 1, 1))).unwrap();
        let b = Record::create(&conn, Campaign::new("B", date(2023, 1, 2))).unwrap();

        primary.set_campaigns(&conn, &[a.id, b.id]).unwrap();
        runoff.set_campaigns(&conn, &[a.id]).unwrap();

        let names: Vec<String> = primary
            .campaigns(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.data.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);

        let elections = a.elections_for_campaign(&conn).unwrap();
        assert_eq!(elections.len(), 2);
        assert_eq!(elections[0].id, runoff.id);

        // Deleting a campaign drops its ballot rows
        Record::<Campaign>::delete(&conn, b.id).unwrap();
        assert_eq!(primary.campaigns(&conn).unwrap().len(), 1);

        // Deleting an election nulls the campaigns' primary election link
        let mut c = Campaign::new("C", date(2023, 1, 3));
        c.election_id = Some(runoff.id);
        let c = Record::create(&conn, c).unwrap();
        Record::<Election>::delete(&conn, runoff.id).unwrap();
        assert_eq!(Record::<Campaign>::get(&conn, c.id).unwrap().election_id, None);
        assert_eq!(a.elections_for_campaign(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_campaign_requires_name() {
        let conn = open_in_memory().unwrap();
        assert!(Record::create(&conn, Campaign::new("", date(2023, 1, 1))).is_err());
    }
}
