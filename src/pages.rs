// 🧾 Page assembly - list and detail contexts for the public site
//
// A `View` is a record plus what a page needs to show it: its title, the name
// of its category, and a label + UUID for every linked row. Detail contexts
// add the related records (relationships, offices, campaigns, transactions,
// contact records).

use crate::error::{Error, Result};
use crate::listing::{self, ListingOptions, ListingQuery};
use crate::models::contact::HasAssociatedEntities;
use crate::models::{
    Address, AssumedName, Campaign, Category, CategoryKind, Document, Election, Email, Entity,
    ExternalId, FieldKind, FormerOfficeHolder, Industry, Link, Office, PhoneNumber, Record,
    Relationship, ReportedSubtotals, ReportedTotals, Table, Transaction, Website,
};
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Number of contributions shown on the home page
pub const HOME_TRANSACTIONS: usize = 10;

// ============================================================================
// VIEW
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct View<T> {
    #[serde(flatten)]
    pub record: Record<T>,
    pub title: String,
    pub category: Option<String>,
    /// Linked rows keyed by foreign-key column
    pub links: BTreeMap<&'static str, Link>,
}

pub fn view<T: Page>(conn: &Connection, record: Record<T>) -> Result<View<T>> {
    let mut category = None;
    let mut links = BTreeMap::new();

    for (field, value) in T::FIELDS.iter().zip(record.to_values()) {
        let Value::Integer(id) = value else {
            continue;
        };
        match field.kind {
            FieldKind::Category(kind) => category = Category::name_of(conn, kind, Some(id))?,
            FieldKind::Link { target, .. } => {
                if let Some(link) = Link::load(conn, target, Some(id))? {
                    links.insert(field.column, link);
                }
            }
            _ => {}
        }
    }

    Ok(View {
        title: record.title(),
        record,
        category,
        links,
    })
}

pub fn views<T: Page>(conn: &Connection, records: Vec<Record<T>>) -> Result<Vec<View<T>>> {
    records.into_iter().map(|record| view(conn, record)).collect()
}

fn entity_links(records: Vec<Record<Entity>>) -> Vec<Link> {
    records
        .into_iter()
        .map(|entity| {
            let name = entity.short_name();
            Link::of(&entity, name)
        })
        .collect()
}

/// Look a record up by the UUID in a URL; malformed keys are simply not found
pub fn find<T: Table>(conn: &Connection, key: &str) -> Result<Record<T>> {
    let uuid = Uuid::parse_str(key).map_err(|_| Error::not_found(T::KIND, key))?;
    Record::get_by_uuid(conn, &uuid)
}

// ============================================================================
// PAGE TRAIT
// ============================================================================

/// A record type with public pages
pub trait Page: Table + Serialize + Clone + Send + 'static {
    /// URL segment and template prefix
    const ROUTE: &'static str;

    /// Filter/sort option tables; `None` for fixed-order listings
    const LISTING: Option<ListingOptions> = None;

    /// Order of fixed-order listings
    const ORDER: &'static str = "id";

    type Detail: Serialize;

    fn title(&self) -> String;

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail>;
}

#[derive(Debug, Serialize)]
pub struct ListPage<T> {
    pub object_list: Vec<View<T>>,
    pub filter_categories: Vec<&'static str>,
    pub sort_by_fields: Vec<&'static str>,
    pub selected_category: Option<String>,
    pub selected_sortby: Option<String>,
}

pub fn list_page<T: Page>(conn: &Connection, query: &ListingQuery) -> Result<ListPage<T>> {
    let (records, filter_categories, sort_by_fields) = match T::LISTING {
        Some(options) => (
            options.query::<T>(conn, query)?,
            options.filter_labels(),
            options.sort_labels(),
        ),
        None => (Record::<T>::all(conn, T::ORDER)?, Vec::new(), Vec::new()),
    };

    Ok(ListPage {
        object_list: views(conn, records)?,
        filter_categories,
        sort_by_fields,
        selected_category: query.category.clone(),
        selected_sortby: query.sortby.clone(),
    })
}

pub fn detail_page<T: Page>(conn: &Connection, key: &str) -> Result<T::Detail> {
    let record = find::<T>(conn, key)?;
    T::detail(conn, view(conn, record)?)
}

/// Detail context of records shown without related lists
#[derive(Debug, Serialize)]
pub struct Detail<T> {
    pub object: View<T>,
}

// ============================================================================
// HOME + INDUSTRY SECTORS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub transaction_list: Vec<View<Transaction>>,
}

pub fn home_page(conn: &Connection) -> Result<HomePage> {
    let latest = Record::<Transaction>::latest_in_category(conn, "contribution", HOME_TRANSACTIONS)?;
    Ok(HomePage {
        transaction_list: views(conn, latest)?,
    })
}

#[derive(Debug, Serialize)]
pub struct SectorList {
    pub object_list: Vec<Category>,
}

pub fn sector_list(conn: &Connection) -> Result<SectorList> {
    Ok(SectorList {
        object_list: Category::list(conn, CategoryKind::IndustrySector)?,
    })
}

#[derive(Debug, Serialize)]
pub struct SectorDetail {
    pub object: Category,
    pub industries: Vec<View<Industry>>,
}

pub fn sector_detail(conn: &Connection, key: &str) -> Result<SectorDetail> {
    let kind = CategoryKind::IndustrySector;
    let uuid = Uuid::parse_str(key).map_err(|_| Error::not_found(kind.as_str(), key))?;
    let sector = Category::get_by_uuid(conn, kind, &uuid)?;
    let industries = Record::<Industry>::filter(conn, "sector_id = ?1", [sector.id], "name, id")?;

    Ok(SectorDetail {
        object: sector,
        industries: views(conn, industries)?,
    })
}

// ============================================================================
// ENTITIES
// ============================================================================

impl Page for Industry {
    const ROUTE: &'static str = "industry";
    const ORDER: &'static str = "name, id";
    type Detail = Detail<Industry>;

    fn title(&self) -> String {
        self.name.clone()
    }

    fn detail(_conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(Detail { object })
    }
}

#[derive(Debug, Serialize)]
pub struct EntityDetail {
    pub object: View<Entity>,
    pub sort_name: String,
    pub full_name: String,
    pub relationships_as_parent: Vec<View<Relationship>>,
    pub relationships_as_child: Vec<View<Relationship>>,
    pub offices_held: Vec<View<Office>>,
    pub government_offices: Vec<View<Office>>,
    pub former_offices: Vec<View<FormerOfficeHolder>>,
    pub candidate_campaigns: Vec<View<Campaign>>,
    pub treasurer_campaigns: Vec<View<Campaign>>,
    pub committee_campaigns: Vec<View<Campaign>>,
    pub elections: Vec<View<Election>>,
    pub transactions_paid: Vec<View<Transaction>>,
    pub transactions_received: Vec<View<Transaction>>,
    pub documents: Vec<View<Document>>,
    pub addresses: Vec<View<Address>>,
    pub phone_numbers: Vec<View<PhoneNumber>>,
    pub emails: Vec<View<Email>>,
    pub websites: Vec<View<Website>>,
    pub assumed_names: Vec<View<AssumedName>>,
    pub external_ids: Vec<View<ExternalId>>,
    pub issued_ids: Vec<View<ExternalId>>,
}

/// Contact records the entity owns or is associated with
fn contact_records<T>(conn: &Connection, entity_id: i64) -> Result<Vec<Record<T>>>
where
    T: HasAssociatedEntities,
{
    let clause = format!(
        "owner_id = ?1 OR id IN (SELECT {} FROM {} WHERE entity_id = ?1)",
        T::ENTITIES.owner_column,
        T::ENTITIES.table
    );
    Record::<T>::filter(conn, &clause, [entity_id], T::LIST_ORDER)
}

fn campaigns_by_role(conn: &Connection, column: &str, entity_id: i64) -> Result<Vec<View<Campaign>>> {
    let campaigns = Record::<Campaign>::filter(
        conn,
        &format!("{column} = ?1"),
        [entity_id],
        "registration_date DESC, id",
    )?;
    views(conn, campaigns)
}

impl Page for Entity {
    const ROUTE: &'static str = "entity";
    const LISTING: Option<ListingOptions> = Some(listing::ENTITY);
    type Detail = EntityDetail;

    fn title(&self) -> String {
        self.short_name()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        let id = object.record.id;
        let as_parent = Record::<Relationship>::filter(conn, "parent_entity_id = ?1", [id], "id")?;
        let as_child = Record::<Relationship>::filter(conn, "child_entity_id = ?1", [id], "id")?;
        let external_ids = Record::<ExternalId>::filter(conn, "child_entity_id = ?1", [id], "id")?;
        let issued_ids = Record::<ExternalId>::filter(conn, "parent_entity_id = ?1", [id], "id")?;

        Ok(EntityDetail {
            sort_name: object.record.sort_name(),
            full_name: object.record.full_name(),
            relationships_as_parent: views(conn, as_parent)?,
            relationships_as_child: views(conn, as_child)?,
            offices_held: views(conn, Record::<Office>::held_by(conn, id)?)?,
            government_offices: views(conn, Record::<Office>::of_government(conn, id)?)?,
            former_offices: views(conn, Record::<FormerOfficeHolder>::for_entity(conn, id)?)?,
            candidate_campaigns: campaigns_by_role(conn, "candidate_entity_id", id)?,
            treasurer_campaigns: campaigns_by_role(conn, "treasurer_entity_id", id)?,
            committee_campaigns: campaigns_by_role(conn, "committee_entity_id", id)?,
            elections: views(conn, Record::<Election>::of_government(conn, id)?)?,
            transactions_paid: views(conn, Record::<Transaction>::paid_by(conn, id)?)?,
            transactions_received: views(conn, Record::<Transaction>::received_by(conn, id)?)?,
            documents: views(conn, Record::<Document>::involving(conn, id)?)?,
            addresses: views(conn, Record::<Address>::for_entity(conn, id)?)?,
            phone_numbers: views(conn, contact_records::<PhoneNumber>(conn, id)?)?,
            emails: views(conn, contact_records::<Email>(conn, id)?)?,
            websites: views(conn, contact_records::<Website>(conn, id)?)?,
            assumed_names: views(conn, Record::<AssumedName>::associated_with(conn, id)?)?,
            external_ids: views(conn, external_ids)?,
            issued_ids: views(conn, issued_ids)?,
            object,
        })
    }
}

impl Page for ExternalId {
    const ROUTE: &'static str = "externalid";
    type Detail = Detail<ExternalId>;

    fn title(&self) -> String {
        format!("External ID {}", self.number)
    }

    fn detail(_conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(Detail { object })
    }
}

impl Page for Relationship {
    const ROUTE: &'static str = "relationship";
    const LISTING: Option<ListingOptions> = Some(listing::RELATIONSHIP);
    type Detail = Detail<Relationship>;

    fn title(&self) -> String {
        "Relationship".to_string()
    }

    fn detail(_conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(Detail { object })
    }
}

// ============================================================================
// OFFICES, ELECTIONS, CAMPAIGNS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OfficeDetail {
    pub object: View<Office>,
    pub former_holders: Vec<View<FormerOfficeHolder>>,
    pub campaigns: Vec<View<Campaign>>,
}

impl Page for Office {
    const ROUTE: &'static str = "office";
    const LISTING: Option<ListingOptions> = Some(listing::OFFICE);
    type Detail = OfficeDetail;

    fn title(&self) -> String {
        self.name.clone()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        let id = object.record.id;
        Ok(OfficeDetail {
            former_holders: views(conn, Record::<FormerOfficeHolder>::for_office(conn, id)?)?,
            campaigns: views(conn, Record::<Campaign>::for_office(conn, id)?)?,
            object,
        })
    }
}

impl Page for FormerOfficeHolder {
    const ROUTE: &'static str = "formerofficeholder";
    const LISTING: Option<ListingOptions> = Some(listing::FORMER_OFFICE_HOLDER);
    type Detail = Detail<FormerOfficeHolder>;

    fn title(&self) -> String {
        "Former office holder".to_string()
    }

    fn detail(_conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(Detail { object })
    }
}

#[derive(Debug, Serialize)]
pub struct ElectionDetail {
    pub object: View<Election>,
    pub campaigns: Vec<View<Campaign>>,
}

impl Page for Election {
    const ROUTE: &'static str = "election";
    const LISTING: Option<ListingOptions> = Some(listing::ELECTION);
    type Detail = ElectionDetail;

    fn title(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        let campaigns = object.record.campaigns(conn)?;
        Ok(ElectionDetail {
            campaigns: views(conn, campaigns)?,
            object,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CampaignDetail {
    pub object: View<Campaign>,
    pub elections: Vec<View<Election>>,
    pub transactions: Vec<View<Transaction>>,
}

impl Page for Campaign {
    const ROUTE: &'static str = "campaign";
    const LISTING: Option<ListingOptions> = Some(listing::CAMPAIGN);
    type Detail = CampaignDetail;

    fn title(&self) -> String {
        self.name.clone()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        let elections = object.record.elections_for_campaign(conn)?;
        let transactions = Record::<Transaction>::for_campaign(conn, object.record.id)?;
        Ok(CampaignDetail {
            elections: views(conn, elections)?,
            transactions: views(conn, transactions)?,
            object,
        })
    }
}

// ============================================================================
// DOCUMENTS + TRANSACTIONS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DocumentDetail {
    pub object: View<Document>,
    pub totals: Option<View<ReportedTotals>>,
    pub subtotals: Option<View<ReportedSubtotals>>,
    pub transactions: Vec<View<Transaction>>,
}

impl Page for Document {
    const ROUTE: &'static str = "document";
    const LISTING: Option<ListingOptions> = Some(listing::DOCUMENT);
    type Detail = DocumentDetail;

    fn title(&self) -> String {
        self.name.clone()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        let totals = object.record.totals(conn)?.map(|t| view(conn, t)).transpose()?;
        let subtotals = object.record.subtotals(conn)?.map(|s| view(conn, s)).transpose()?;
        let transactions = Record::<Transaction>::for_document(conn, object.record.id)?;
        Ok(DocumentDetail {
            totals,
            subtotals,
            transactions: views(conn, transactions)?,
            object,
        })
    }
}

impl Page for ReportedTotals {
    const ROUTE: &'static str = "reportedtotals";
    type Detail = Detail<ReportedTotals>;

    fn title(&self) -> String {
        "Reported totals".to_string()
    }

    fn detail(_conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(Detail { object })
    }
}

impl Page for ReportedSubtotals {
    const ROUTE: &'static str = "reportedsubtotals";
    type Detail = Detail<ReportedSubtotals>;

    fn title(&self) -> String {
        "Reported subtotals".to_string()
    }

    fn detail(_conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(Detail { object })
    }
}

impl Page for Transaction {
    const ROUTE: &'static str = "transaction";
    const LISTING: Option<ListingOptions> = Some(listing::TRANSACTION);
    type Detail = Detail<Transaction>;

    fn title(&self) -> String {
        format!("${}", self.amount)
    }

    fn detail(_conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(Detail { object })
    }
}

// ============================================================================
// CONTACT RECORDS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AddressDetail {
    pub object: View<Address>,
    pub residents: Vec<Link>,
    pub owners: Vec<Link>,
}

impl Page for Address {
    const ROUTE: &'static str = "address";
    const LISTING: Option<ListingOptions> = Some(listing::ADDRESS);
    type Detail = AddressDetail;

    fn title(&self) -> String {
        self.one_line()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        Ok(AddressDetail {
            residents: entity_links(object.record.residents(conn)?),
            owners: entity_links(object.record.owners(conn)?),
            object,
        })
    }
}

/// Detail context of a contact record with associated entities
#[derive(Debug, Serialize)]
pub struct ContactDetail<T> {
    pub object: View<T>,
    pub associated_entities: Vec<Link>,
}

fn contact_detail<T: Page + HasAssociatedEntities>(conn: &Connection, object: View<T>) -> Result<ContactDetail<T>> {
    Ok(ContactDetail {
        associated_entities: entity_links(object.record.associated_entities(conn)?),
        object,
    })
}

impl Page for PhoneNumber {
    const ROUTE: &'static str = "phonenumber";
    const LISTING: Option<ListingOptions> = Some(listing::PHONE_NUMBER);
    type Detail = ContactDetail<PhoneNumber>;

    fn title(&self) -> String {
        self.formatted()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        contact_detail(conn, object)
    }
}

impl Page for Email {
    const ROUTE: &'static str = "email";
    const LISTING: Option<ListingOptions> = Some(listing::EMAIL);
    type Detail = ContactDetail<Email>;

    fn title(&self) -> String {
        self.address.clone()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        contact_detail(conn, object)
    }
}

impl Page for Website {
    const ROUTE: &'static str = "website";
    const ORDER: &'static str = "address, id";
    type Detail = ContactDetail<Website>;

    fn title(&self) -> String {
        self.address.clone()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        contact_detail(conn, object)
    }
}

impl Page for AssumedName {
    const ROUTE: &'static str = "assumedname";
    const ORDER: &'static str = "name, id";
    type Detail = ContactDetail<AssumedName>;

    fn title(&self) -> String {
        self.name.clone()
    }

    fn detail(conn: &Connection, object: View<Self>) -> Result<Self::Detail> {
        contact_detail(conn, object)
    }
}
