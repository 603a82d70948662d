// 🛠️ Admin - per-model form configuration and generic CRUD over submitted forms
//
// Every model gets a `ModelAdmin`: its stored fields (shared with the record
// layer), titled fieldsets, list columns, search columns, entity pickers
// restricted to one entity category, and many-to-many entity fields.
//
// Submitted forms arrive as raw (name, value) pairs, are parsed into column
// values with per-field errors, and are written with SQL built from the
// static field tables only.

use crate::error::{Error, Result};
use crate::models::association::{
    ADDRESS_OWNERS, ADDRESS_RESIDENTS, ASSUMED_NAME_ENTITIES, ELECTION_CAMPAIGNS, EMAIL_ENTITIES,
    PHONE_NUMBER_ENTITIES, WEBSITE_ENTITIES,
};
use crate::models::{
    cents_to_decimal, decimal_to_cents, read_uuid, validate_values, Address, AssumedName,
    Association, Campaign, Category, CategoryKind, Document, Election, Email, Entity, ExternalId,
    Field, FieldKind, FormerOfficeHolder, Industry, Office, PhoneNumber, Relationship,
    ReportedSubtotals, ReportedTotals, Table, Target, Transaction, Website, MONEY_SCALE_ERROR,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Fieldset {
    pub title: Option<&'static str>,
    pub fields: &'static [&'static str],
}

const fn fieldset(title: &'static str, fields: &'static [&'static str]) -> Fieldset {
    Fieldset { title: Some(title), fields }
}

const fn untitled(fields: &'static [&'static str]) -> Fieldset {
    Fieldset { title: None, fields }
}

/// Multi-select of linked rows, saved through an association table
#[derive(Debug, Clone, Copy)]
pub struct ManyToMany {
    pub name: &'static str,
    pub label: &'static str,
    pub target: Target,
    pub association: Association,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelAdmin {
    /// URL segment under /admin
    pub slug: &'static str,
    pub title: &'static str,
    pub table: &'static str,
    pub fields: &'static [Field],
    pub fieldsets: &'static [Fieldset],
    pub list_display: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    /// Entity picker column -> entity category name its choices are limited to
    pub entity_categories: &'static [(&'static str, &'static str)],
    pub many_to_many: &'static [ManyToMany],
}

const CATEGORY_FIELDS: &[Field] = &[Field::required_text("name", "Name", 300)];

const CATEGORY_FIELDSETS: &[Fieldset] = &[untitled(&["name"])];

const fn category_admin(slug: &'static str, title: &'static str, kind: CategoryKind) -> ModelAdmin {
    ModelAdmin {
        slug,
        title,
        table: kind.table(),
        fields: CATEGORY_FIELDS,
        fieldsets: CATEGORY_FIELDSETS,
        list_display: &["name"],
        search_fields: &["name"],
        entity_categories: &[],
        many_to_many: &[],
    }
}

const fn associated_entities(association: Association) -> ManyToMany {
    ManyToMany {
        name: "associated_entities",
        label: "Associated entities",
        target: Target::Entity,
        association,
    }
}

pub const ADMINS: &[ModelAdmin] = &[
    category_admin("entitycategory", "Entity categories", CategoryKind::Entity),
    category_admin("industrysector", "Industry sectors", CategoryKind::IndustrySector),
    ModelAdmin {
        slug: "industry",
        title: "Industries",
        table: Industry::TABLE,
        fields: Industry::FIELDS,
        fieldsets: &[untitled(&["name", "sector_id"])],
        list_display: &["name", "sector_id"],
        search_fields: &["name"],
        entity_categories: &[],
        many_to_many: &[],
    },
    ModelAdmin {
        slug: "entity",
        title: "Entities",
        table: Entity::TABLE,
        fields: Entity::FIELDS,
        fieldsets: &[
            untitled(&["category_id"]),
            fieldset("Name", &["prefix", "first_name", "middle_name", "last_name", "suffix", "nickname"]),
            fieldset("Employment", &["occupation", "industry_id"]),
            fieldset("External links", &["opencorporates_link", "littlesis_link"]),
            fieldset("Notes", &["notes"]),
        ],
        list_display: &["last_name", "first_name", "category_id"],
        search_fields: &["first_name", "middle_name", "last_name"],
        entity_categories: &[],
        many_to_many: &[],
    },
    ModelAdmin {
        slug: "externalid",
        title: "External IDs",
        table: ExternalId::TABLE,
        fields: ExternalId::FIELDS,
        fieldsets: &[
            fieldset("Reporting Agency", &["parent_entity_id"]),
            fieldset("Organization", &["child_entity_id"]),
            fieldset("Agency Internal ID Number", &["number"]),
            fieldset("Notes", &["notes"]),
        ],
        list_display: &["parent_entity_id", "child_entity_id", "number"],
        search_fields: &["number"],
        entity_categories: &[("parent_entity_id", "government")],
        many_to_many: &[],
    },
    category_admin("relationshipcategory", "Relationship categories", CategoryKind::Relationship),
    ModelAdmin {
        slug: "relationship",
        title: "Relationships",
        table: Relationship::TABLE,
        fields: Relationship::FIELDS,
        fieldsets: &[
            fieldset("Relationship Type", &["category_id"]),
            fieldset("Relationship Members", &["parent_entity_id", "child_entity_id"]),
            fieldset("Notes", &["notes"]),
        ],
        list_display: &["category_id", "parent_entity_id", "child_entity_id"],
        search_fields: &[],
        entity_categories: &[],
        many_to_many: &[],
    },
    category_admin("campaigncategory", "Campaign categories", CategoryKind::Campaign),
    ModelAdmin {
        slug: "office",
        title: "Offices",
        table: Office::TABLE,
        fields: Office::FIELDS,
        fieldsets: &[untitled(&["name", "government_entity_id", "holder_entity_id", "notes"])],
        list_display: &["name", "government_entity_id", "holder_entity_id"],
        search_fields: &["name"],
        entity_categories: &[("government_entity_id", "government"), ("holder_entity_id", "individual")],
        many_to_many: &[],
    },
    ModelAdmin {
        slug: "formerofficeholder",
        title: "Former office holders",
        table: FormerOfficeHolder::TABLE,
        fields: FormerOfficeHolder::FIELDS,
        fieldsets: &[
            fieldset("Office", &["office_id"]),
            fieldset("Former Office Holder", &["entity_id"]),
        ],
        list_display: &["office_id", "entity_id"],
        search_fields: &[],
        entity_categories: &[],
        many_to_many: &[],
    },
    ModelAdmin {
        slug: "campaign",
        title: "Campaigns",
        table: Campaign::TABLE,
        fields: Campaign::FIELDS,
        fieldsets: &[
            untitled(&["category_id", "name", "registration_date"]),
            fieldset("Office Information", &["office_sought_id"]),
            fieldset(
                "Campaign Members",
                &["candidate_entity_id", "treasurer_entity_id", "committee_entity_id"],
            ),
            fieldset("Notes", &["notes"]),
            fieldset("Elections", &["election_id"]),
        ],
        list_display: &[
            "name",
            "registration_date",
            "committee_entity_id",
            "category_id",
            "candidate_entity_id",
            "office_sought_id",
        ],
        search_fields: &["name"],
        entity_categories: &[
            ("candidate_entity_id", "individual"),
            ("treasurer_entity_id", "individual"),
            ("committee_entity_id", "committee"),
        ],
        many_to_many: &[],
    },
    category_admin("electioncategory", "Election categories", CategoryKind::Election),
    ModelAdmin {
        slug: "election",
        title: "Elections",
        table: Election::TABLE,
        fields: Election::FIELDS,
        fieldsets: &[
            untitled(&["category_id"]),
            fieldset("Election Information", &["government_entity_id", "date"]),
            fieldset("Notes", &["notes"]),
            fieldset("Campaigns", &["campaigns"]),
        ],
        list_display: &["date", "government_entity_id", "category_id"],
        search_fields: &["date"],
        entity_categories: &[("government_entity_id", "government")],
        many_to_many: &[ManyToMany {
            name: "campaigns",
            label: "Campaigns",
            target: Target::Campaign,
            association: ELECTION_CAMPAIGNS,
        }],
    },
    category_admin("documentcategory", "Document categories", CategoryKind::Document),
    ModelAdmin {
        slug: "document",
        title: "Documents",
        table: Document::TABLE,
        fields: Document::FIELDS,
        fieldsets: &[
            untitled(&["category_id"]),
            fieldset("Document Information", &["name", "filer_entity_id", "officer_oath_entity_id"]),
            fieldset("Dates", &["date_filed", "coverage_start_date", "coverage_end_date"]),
            fieldset("File Information", &["uploaded_file"]),
            fieldset("Notes", &["notes"]),
        ],
        list_display: &["name", "category_id", "date_filed"],
        search_fields: &["name"],
        entity_categories: &[("officer_oath_entity_id", "individual")],
        many_to_many: &[],
    },
    ModelAdmin {
        slug: "reportedtotals",
        title: "Reported totals",
        table: ReportedTotals::TABLE,
        fields: ReportedTotals::FIELDS,
        fieldsets: &[
            fieldset("Parent Document", &["document_id"]),
            fieldset("Contributions", &["unitemized_contributions", "contributions"]),
            fieldset("Expenditures", &["unitemized_expenditures", "expenditures"]),
            fieldset("Maintained Contributions", &["maintained_contributions"]),
            fieldset("Loans", &["principal_outstanding_loans"]),
        ],
        list_display: &["document_id", "contributions", "expenditures"],
        search_fields: &[],
        entity_categories: &[],
        many_to_many: &[],
    },
    ModelAdmin {
        slug: "reportedsubtotals",
        title: "Reported subtotals",
        table: ReportedSubtotals::TABLE,
        fields: ReportedSubtotals::FIELDS,
        fieldsets: &[
            fieldset("Parent Document", &["document_id"]),
            fieldset(
                "Contributions",
                &[
                    "monetary_political_contributions",
                    "non_monetary_political_contributions",
                    "pledged_contributions",
                    "monetary_corporate_labor_contributions",
                    "non_monetary_corporate_labor_contributions",
                    "pledged_corporate_labor_contributions",
                ],
            ),
            fieldset(
                "Expenditures",
                &[
                    "expenditures_from_contributions",
                    "purchased_investments_with_contributions",
                    "expenditures_credit_card",
                    "expenditures_personal_funds",
                    "expenditures_from_contributions_candidate_business",
                    "expenditures_non_political_from_contributions",
                ],
            ),
            fieldset("Loans", &["loans"]),
            fieldset("Unpaid Obligations", &["unpaid_incurred_obligations"]),
            fieldset(
                "Gains/Interest/Credits/Refunds",
                &["interest_credit_gains_refunds_contributions_returned"],
            ),
        ],
        list_display: &["document_id", "monetary_political_contributions", "expenditures_from_contributions"],
        search_fields: &[],
        entity_categories: &[],
        many_to_many: &[],
    },
    category_admin("transactioncategory", "Transaction categories", CategoryKind::Transaction),
    ModelAdmin {
        slug: "transaction",
        title: "Transactions",
        table: Transaction::TABLE,
        fields: &[
            Field::category(CategoryKind::Transaction),
            Field::link("campaign_id", "Campaign", Target::Campaign),
            Field::link("payer_entity_id", "Payer", Target::Entity),
            Field::link("payee_entity_id", "Recipient", Target::Entity),
            Field::money("amount", "Amount"),
            Field::date("recorded_date", "Date", false),
            Field::text("reason", "Reason", 1000),
            Field::link("document_id", "Document", Target::Document),
            Field::notes(),
        ],
        fieldsets: &[
            untitled(&["category_id"]),
            fieldset("Campaign", &["campaign_id"]),
            fieldset("Payer", &["payer_entity_id"]),
            fieldset("Recipient", &["payee_entity_id"]),
            fieldset("Amount", &["amount"]),
            fieldset("Date", &["recorded_date"]),
            fieldset("Transaction Information", &["reason", "document_id"]),
            fieldset("Notes", &["notes"]),
        ],
        list_display: &["recorded_date", "payer_entity_id", "payee_entity_id", "amount"],
        search_fields: &["reason"],
        entity_categories: &[],
        many_to_many: &[],
    },
    category_admin("addresscategory", "Address categories", CategoryKind::Address),
    ModelAdmin {
        slug: "address",
        title: "Addresses",
        table: Address::TABLE,
        fields: Address::FIELDS,
        fieldsets: &[
            untitled(&["category_id"]),
            fieldset(
                "Street Address",
                &[
                    "building_number",
                    "street_name",
                    "unit_number",
                    "floor_number",
                    "city_name",
                    "state_name",
                    "county_name",
                ],
            ),
            fieldset("Zip Code", &["zip_code", "zip_code_extension"]),
            fieldset("Notes", &["notes"]),
            fieldset("Residents", &["residents"]),
            fieldset("Owners", &["owners"]),
        ],
        list_display: &[
            "category_id",
            "building_number",
            "street_name",
            "unit_number",
            "city_name",
            "state_name",
            "zip_code",
        ],
        search_fields: &["street_name", "city_name", "zip_code"],
        entity_categories: &[],
        many_to_many: &[
            ManyToMany {
                name: "residents",
                label: "Residents",
                target: Target::Entity,
                association: ADDRESS_RESIDENTS,
            },
            ManyToMany {
                name: "owners",
                label: "Owners",
                target: Target::Entity,
                association: ADDRESS_OWNERS,
            },
        ],
    },
    ModelAdmin {
        slug: "phonenumber",
        title: "Phone numbers",
        table: PhoneNumber::TABLE,
        fields: PhoneNumber::FIELDS,
        fieldsets: &[untitled(&[
            "country_code",
            "area_code",
            "number",
            "owner_id",
            "notes",
            "associated_entities",
        ])],
        list_display: &["area_code", "number", "owner_id"],
        search_fields: &["area_code", "number"],
        entity_categories: &[],
        many_to_many: &[associated_entities(PHONE_NUMBER_ENTITIES)],
    },
    ModelAdmin {
        slug: "email",
        title: "Emails",
        table: Email::TABLE,
        fields: Email::FIELDS,
        fieldsets: &[untitled(&["address", "owner_id", "notes", "associated_entities"])],
        list_display: &["address", "owner_id"],
        search_fields: &["address"],
        entity_categories: &[],
        many_to_many: &[associated_entities(EMAIL_ENTITIES)],
    },
    ModelAdmin {
        slug: "website",
        title: "Websites",
        table: Website::TABLE,
        fields: Website::FIELDS,
        fieldsets: &[untitled(&["address", "owner_id", "notes", "associated_entities"])],
        list_display: &["address", "owner_id"],
        search_fields: &["address"],
        entity_categories: &[],
        many_to_many: &[associated_entities(WEBSITE_ENTITIES)],
    },
    ModelAdmin {
        slug: "assumedname",
        title: "Assumed names",
        table: AssumedName::TABLE,
        fields: AssumedName::FIELDS,
        fieldsets: &[untitled(&["name", "notes", "associated_entities"])],
        list_display: &["name"],
        search_fields: &["name"],
        entity_categories: &[],
        many_to_many: &[associated_entities(ASSUMED_NAME_ENTITIES)],
    },
];

pub fn find_admin(slug: &str) -> Option<&'static ModelAdmin> {
    ADMINS.iter().find(|admin| admin.slug == slug)
}

// ============================================================================
// CHOICES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: i64,
    pub label: String,
    pub selected: bool,
}

impl ModelAdmin {
    pub fn field(&self, column: &str) -> Option<&'static Field> {
        self.fields.iter().find(|field| field.column == column)
    }

    fn many(&self, name: &str) -> Option<&'static ManyToMany> {
        self.many_to_many.iter().find(|m2m| m2m.name == name)
    }

    /// Entity category a picker is restricted to, if any
    pub fn restriction(&self, column: &str) -> Option<&'static str> {
        self.entity_categories
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, name)| *name)
    }

    /// (id, label) pairs a picker offers; a restriction to a missing category offers none
    pub fn choices(&self, conn: &Connection, field: &Field) -> Result<Vec<(i64, String)>> {
        match field.kind {
            FieldKind::Category(kind) => Ok(Category::list(conn, kind)?
                .into_iter()
                .map(|category| (category.id, category.name))
                .collect()),
            FieldKind::Link { target, .. } => match self.restriction(field.column) {
                Some(category_name) => {
                    match Category::find_by_name(conn, CategoryKind::Entity, category_name)? {
                        Some(category) => target.choices(conn, Some(category.id)),
                        None => Ok(Vec::new()),
                    }
                }
                None => target.choices(conn, None),
            },
            _ => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// FORM PARSING
// ============================================================================

/// Submitted form values keyed by input name
pub type RawForm = BTreeMap<String, Vec<String>>;

pub fn raw_form(pairs: Vec<(String, String)>) -> RawForm {
    let mut form = RawForm::new();
    for (name, value) in pairs {
        form.entry(name).or_default().push(value);
    }
    form
}

fn first<'a>(form: &'a RawForm, name: &str) -> &'a str {
    form.get(name)
        .and_then(|values| values.first())
        .map(|value| value.trim())
        .unwrap_or("")
}

/// Column values plus many-to-many selections, or per-field errors
#[derive(Debug, Default)]
pub struct Submission {
    pub values: Vec<Value>,
    pub many: Vec<Vec<i64>>,
    pub errors: BTreeMap<String, String>,
}

impl Submission {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn parse_id(text: &str) -> Option<i64> {
    text.parse::<i64>().ok()
}

pub fn parse_form(conn: &Connection, admin: &ModelAdmin, form: &RawForm) -> Result<Submission> {
    let mut submission = Submission::default();

    for field in admin.fields {
        let text = first(form, field.column);
        let value = match field.kind {
            FieldKind::Text { .. } | FieldKind::Notes | FieldKind::Url { .. } | FieldKind::File => {
                Ok(Value::Text(text.to_string()))
            }
            FieldKind::Date { .. } if text.is_empty() => Ok(Value::Null),
            FieldKind::Date { .. } => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|date| Value::Text(date.format("%Y-%m-%d").to_string()))
                .map_err(|_| "Enter a valid date.".to_string()),
            FieldKind::Money if text.is_empty() => Ok(Value::Integer(0)),
            FieldKind::Money => match Decimal::from_str(text) {
                Ok(amount) if amount.normalize().scale() > 2 => Err(MONEY_SCALE_ERROR.to_string()),
                Ok(amount) => Ok(Value::Integer(decimal_to_cents(amount))),
                Err(_) => Err("Enter a number.".to_string()),
            },
            FieldKind::Category(_) | FieldKind::Link { .. } if text.is_empty() => Ok(Value::Null),
            FieldKind::Category(_) | FieldKind::Link { .. } => {
                let allowed = admin.choices(conn, field)?;
                match parse_id(text) {
                    Some(id) if allowed.iter().any(|(choice, _)| *choice == id) => Ok(Value::Integer(id)),
                    _ => Err(INVALID_CHOICE.to_string()),
                }
            }
        };

        match value {
            Ok(value) => {
                if let Err(Error::Validation { message, .. }) =
                    validate_values(std::slice::from_ref(field), std::slice::from_ref(&value))
                {
                    submission.errors.insert(field.column.to_string(), message);
                }
                submission.values.push(value);
            }
            Err(message) => {
                submission.errors.insert(field.column.to_string(), message);
                submission.values.push(Value::Null);
            }
        }
    }

    for m2m in admin.many_to_many {
        let allowed = m2m.target.choices(conn, None)?;
        let mut ids = Vec::new();
        for text in form.get(m2m.name).into_iter().flatten() {
            match parse_id(text.trim()) {
                Some(id) if allowed.iter().any(|(choice, _)| *choice == id) => ids.push(id),
                _ => {
                    submission.errors.insert(m2m.name.to_string(), INVALID_CHOICE.to_string());
                }
            }
        }
        submission.many.push(ids);
    }

    Ok(submission)
}

// ============================================================================
// CRUD
// ============================================================================

fn column_list(admin: &ModelAdmin) -> String {
    admin.fields.iter().map(|f| f.column).collect::<Vec<_>>().join(", ")
}

fn save_many(conn: &Connection, admin: &ModelAdmin, id: i64, submission: &Submission) -> Result<()> {
    for (m2m, ids) in admin.many_to_many.iter().zip(&submission.many) {
        m2m.association.set(conn, id, ids)?;
    }
    Ok(())
}

/// Insert a valid submission; returns the new row id
pub fn create(conn: &Connection, admin: &ModelAdmin, submission: &Submission) -> Result<i64> {
    if let Some((field, message)) = submission.errors.iter().next() {
        return Err(Error::validation(field, message.clone()));
    }

    let placeholders: Vec<String> = (2..=submission.values.len() + 1).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} (uuid, {}) VALUES (?1, {})",
        admin.table,
        column_list(admin),
        placeholders.join(", ")
    );
    let uuid = Uuid::new_v4();
    let mut params = vec![Value::Text(uuid.to_string())];
    params.extend(submission.values.iter().cloned());

    let tx = conn.unchecked_transaction()?;
    tx.execute(&sql, params_from_iter(params))?;
    let id = tx.last_insert_rowid();
    save_many(&tx, admin, id, submission)?;
    tx.commit()?;

    tracing::info!(model = admin.slug, id, %uuid, "admin created record");
    Ok(id)
}

pub fn update(conn: &Connection, admin: &ModelAdmin, id: i64, submission: &Submission) -> Result<()> {
    if let Some((field, message)) = submission.errors.iter().next() {
        return Err(Error::validation(field, message.clone()));
    }

    let assignments: Vec<String> = admin
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = ?{}", f.column, i + 2))
        .collect();
    let sql = format!("UPDATE {} SET {} WHERE id = ?1", admin.table, assignments.join(", "));
    let mut params = vec![Value::Integer(id)];
    params.extend(submission.values.iter().cloned());

    let tx = conn.unchecked_transaction()?;
    if tx.execute(&sql, params_from_iter(params))? == 0 {
        return Err(Error::not_found(admin.slug, id));
    }
    save_many(&tx, admin, id, submission)?;
    tx.commit()?;

    tracing::info!(model = admin.slug, id, "admin updated record");
    Ok(())
}

pub fn delete(conn: &Connection, admin: &ModelAdmin, id: i64) -> Result<()> {
    let changed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", admin.table), [id])?;
    if changed == 0 {
        return Err(Error::not_found(admin.slug, id));
    }
    tracing::info!(model = admin.slug, id, "admin deleted record");
    Ok(())
}

fn value_text(field: Option<&Field>, value: Value) -> String {
    match (field.map(|f| f.kind), value) {
        (_, Value::Null) => String::new(),
        (Some(FieldKind::Money), Value::Integer(cents)) => cents_to_decimal(cents).to_string(),
        (_, Value::Integer(i)) => i.to_string(),
        (_, Value::Real(r)) => r.to_string(),
        (_, Value::Text(text)) => text,
        (_, Value::Blob(_)) => String::new(),
    }
}

/// Stored values of a row, in form shape, for the edit page
pub fn load_form(conn: &Connection, admin: &ModelAdmin, id: i64) -> Result<RawForm> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", column_list(admin), admin.table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([id])?;
    let row = rows.next()?.ok_or_else(|| Error::not_found(admin.slug, id))?;

    let mut form = RawForm::new();
    for (i, field) in admin.fields.iter().enumerate() {
        let value: Value = row.get(i)?;
        form.insert(field.column.to_string(), vec![value_text(Some(field), value)]);
    }
    for m2m in admin.many_to_many {
        let ids = m2m.association.target_ids(conn, id)?;
        form.insert(m2m.name.to_string(), ids.iter().map(|id| id.to_string()).collect());
    }
    Ok(form)
}

// ============================================================================
// CHANGE LIST
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AdminRow {
    pub id: i64,
    pub uuid: Uuid,
    pub cells: Vec<String>,
}

fn display_sql(field: Option<&Field>, column: &str) -> String {
    match field.map(|f| f.kind) {
        Some(FieldKind::Category(kind)) => {
            format!("(SELECT name FROM {} WHERE id = t.{column})", kind.table())
        }
        Some(FieldKind::Link { target, .. }) => format!(
            "(SELECT {} FROM {} WHERE id = t.{column})",
            target.label_sql(),
            target.table()
        ),
        _ => format!("t.{column}"),
    }
}

impl ModelAdmin {
    /// Column headers of the change list
    pub fn list_headers(&self) -> Vec<&'static str> {
        self.list_display
            .iter()
            .map(|column| self.field(column).map(|f| f.label).unwrap_or(*column))
            .collect()
    }
}

/// Rows for the change list, newest first, optionally searched with `q`
pub fn list(conn: &Connection, admin: &ModelAdmin, q: Option<&str>) -> Result<Vec<AdminRow>> {
    let cells: Vec<String> = admin
        .list_display
        .iter()
        .map(|column| display_sql(admin.field(column), column))
        .collect();

    let q = q.map(str::trim).filter(|q| !q.is_empty() && !admin.search_fields.is_empty());
    let clause = match q {
        Some(_) => admin
            .search_fields
            .iter()
            .map(|column| format!("t.{column} LIKE ?1"))
            .collect::<Vec<_>>()
            .join(" OR "),
        None => "1 = 1".to_string(),
    };
    let sql = format!(
        "SELECT t.id, t.uuid, {} FROM {} t WHERE {} ORDER BY t.id DESC",
        cells.join(", "),
        admin.table,
        clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<Value> = q.map(|q| Value::Text(format!("%{q}%"))).into_iter().collect();
    let rows = stmt.query_map(params_from_iter(params), |row| {
        let mut cells = Vec::with_capacity(admin.list_display.len());
        for (i, column) in admin.list_display.iter().enumerate() {
            let value: Value = row.get(i + 2)?;
            cells.push(value_text(admin.field(column), value));
        }
        Ok(AdminRow {
            id: row.get(0)?,
            uuid: read_uuid(row, 1)?,
            cells,
        })
    })?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ============================================================================
// FORM RENDERING
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    /// text | textarea | url | date | number | file | select | multiselect
    pub widget: &'static str,
    pub required: bool,
    pub value: String,
    pub choices: Vec<Choice>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSection {
    pub title: Option<&'static str>,
    pub fields: Vec<FormField>,
}

fn widget(kind: FieldKind) -> (&'static str, bool) {
    match kind {
        FieldKind::Text { required, .. } => ("text", required),
        FieldKind::Notes => ("textarea", false),
        FieldKind::Url { .. } => ("url", false),
        FieldKind::Date { required } => ("date", required),
        FieldKind::Money => ("number", false),
        FieldKind::Category(_) => ("select", false),
        FieldKind::Link { required, .. } => ("select", required),
        FieldKind::File => ("file", false),
    }
}

/// Fieldsets populated with values, choices, and errors
pub fn form_sections(
    conn: &Connection,
    admin: &ModelAdmin,
    form: &RawForm,
    errors: &BTreeMap<String, String>,
) -> Result<Vec<FormSection>> {
    let mut sections = Vec::with_capacity(admin.fieldsets.len());

    for set in admin.fieldsets {
        let mut fields = Vec::with_capacity(set.fields.len());
        for name in set.fields {
            let submitted: Vec<&str> = form
                .get(*name)
                .map(|values| values.iter().map(|v| v.as_str()).collect())
                .unwrap_or_default();
            let error = errors.get(*name).cloned();

            if let Some(field) = admin.field(name) {
                let (widget, required) = widget(field.kind);
                let choices = admin
                    .choices(conn, field)?
                    .into_iter()
                    .map(|(id, label)| Choice {
                        selected: submitted.contains(&id.to_string().as_str()),
                        id,
                        label,
                    })
                    .collect();
                fields.push(FormField {
                    name: field.column,
                    label: field.label,
                    widget,
                    required,
                    value: submitted.first().map(|v| v.to_string()).unwrap_or_default(),
                    choices,
                    error,
                });
            } else if let Some(m2m) = admin.many(name) {
                let choices = m2m
                    .target
                    .choices(conn, None)?
                    .into_iter()
                    .map(|(id, label)| Choice {
                        selected: submitted.contains(&id.to_string().as_str()),
                        id,
                        label,
                    })
                    .collect();
                fields.push(FormField {
                    name: m2m.name,
                    label: m2m.label,
                    widget: "multiselect",
                    required: false,
                    value: String::new(),
                    choices,
                    error,
                });
            }
        }
        sections.push(FormSection { title: set.title, fields });
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::schema::{open_in_memory, RECORD_TABLES};

    fn form(pairs: &[(&str, &str)]) -> RawForm {
        raw_form(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_every_table_has_an_admin() {
        for table in RECORD_TABLES {
            assert!(ADMINS.iter().any(|admin| admin.table == table), "{table}");
        }
    }

    #[test]
    fn test_fieldsets_name_known_fields() {
        for admin in ADMINS {
            for set in admin.fieldsets {
                for name in set.fields {
                    assert!(
                        admin.field(name).is_some() || admin.many(name).is_some(),
                        "{}: {name}",
                        admin.slug
                    );
                }
            }
            for column in admin.list_display.iter().chain(admin.entity_categories.iter().map(|(c, _)| c)) {
                assert!(admin.field(column).is_some(), "{}: {column}", admin.slug);
            }
        }
    }

    #[test]
    fn test_restricted_picker() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("office").unwrap();
        let government_field = admin.field("government_entity_id").unwrap();

        // No "government" category yet: nothing to choose from
        assert!(admin.choices(&conn, government_field).unwrap().is_empty());

        let government = Category::create(&conn, CategoryKind::Entity, "government").unwrap();
        let individual = Category::create(&conn, CategoryKind::Entity, "individual").unwrap();
        let city = Record::create(&conn, Entity::named(Some(government.id), "City of Austin")).unwrap();
        let person = Record::create(&conn, Entity::named(Some(individual.id), "Doe")).unwrap();

        let choices = admin.choices(&conn, government_field).unwrap();
        assert_eq!(choices, vec![(city.id, "City of Austin".to_string())]);

        // Unrestricted pickers see every entity
        let former = find_admin("formerofficeholder").unwrap();
        assert_eq!(former.choices(&conn, former.field("entity_id").unwrap()).unwrap().len(), 2);

        let ok = parse_form(
            &conn,
            admin,
            &form(&[("name", "Mayor"), ("government_entity_id", &city.id.to_string())]),
        )
        .unwrap();
        assert!(ok.is_valid());

        let wrong = parse_form(
            &conn,
            admin,
            &form(&[("name", "Mayor"), ("government_entity_id", &person.id.to_string())]),
        )
        .unwrap();
        assert_eq!(wrong.errors["government_entity_id"], INVALID_CHOICE);
    }

    #[test]
    fn test_parse_form_errors() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("document").unwrap();

        let submission = parse_form(
            &conn,
            admin,
            &form(&[("name", ""), ("date_filed", "2023-13-01"), ("category_id", "42")]),
        )
        .unwrap();

        assert!(!submission.is_valid());
        assert_eq!(submission.errors["name"], "This field is required.");
        assert_eq!(submission.errors["date_filed"], "Enter a valid date.");
        assert_eq!(submission.errors["coverage_start_date"], "This field is required.");
        assert_eq!(submission.errors["category_id"], INVALID_CHOICE);
        assert!(create(&conn, admin, &submission).is_err());
    }

    #[test]
    fn test_create_update_delete_with_many_to_many() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("email").unwrap();
        let jane = Record::create(&conn, Entity::named(None, "Doe")).unwrap();
        let acme = Record::create(&conn, Entity::named(None, "Acme")).unwrap();

        let submission = parse_form(
            &conn,
            admin,
            &form(&[
                ("address", "jane@example.com"),
                ("owner_id", &jane.id.to_string()),
                ("associated_entities", &jane.id.to_string()),
                ("associated_entities", &acme.id.to_string()),
            ]),
        )
        .unwrap();
        assert!(submission.is_valid(), "{:?}", submission.errors);
        let id = create(&conn, admin, &submission).unwrap();

        let email = Record::<Email>::get(&conn, id).unwrap();
        assert_eq!(email.address, "jane@example.com");
        assert_eq!(email.associated_entities(&conn).unwrap().len(), 2);

        let stored = load_form(&conn, admin, id).unwrap();
        assert_eq!(stored["owner_id"], vec![jane.id.to_string()]);
        assert_eq!(stored["associated_entities"].len(), 2);

        // Many-to-many selections are replaced wholesale
        let edit = parse_form(
            &conn,
            admin,
            &form(&[("address", "jane@example.org"), ("associated_entities", &acme.id.to_string())]),
        )
        .unwrap();
        update(&conn, admin, id, &edit).unwrap();
        let email = Record::<Email>::get(&conn, id).unwrap();
        assert_eq!(email.address, "jane@example.org");
        assert_eq!(email.owner_id, None);
        assert_eq!(email.associated_entities(&conn).unwrap()[0].id, acme.id);

        // Duplicate address is a constraint violation
        let again = parse_form(&conn, admin, &form(&[("address", "jane@example.org")])).unwrap();
        assert!(create(&conn, admin, &again).unwrap_err().is_constraint_violation());

        delete(&conn, admin, id).unwrap();
        assert!(delete(&conn, admin, id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_money_fields_round_trip_through_forms() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("reportedtotals").unwrap();

        let submission = parse_form(&conn, admin, &form(&[("contributions", "12.34")])).unwrap();
        assert!(submission.is_valid());
        let id = create(&conn, admin, &submission).unwrap();

        let totals = Record::<ReportedTotals>::get(&conn, id).unwrap();
        assert_eq!(totals.contributions.to_string(), "12.34");
        assert_eq!(totals.expenditures, Decimal::ZERO);
        assert_eq!(load_form(&conn, admin, id).unwrap()["contributions"], vec!["12.34".to_string()]);

        let bad = parse_form(&conn, admin, &form(&[("contributions", "lots")])).unwrap();
        assert_eq!(bad.errors["contributions"], "Enter a number.");
    }

    #[test]
    fn test_money_fields_reject_sub_cent_precision() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("reportedtotals").unwrap();

        let submission = parse_form(&conn, admin, &form(&[("contributions", "1.005")])).unwrap();
        assert!(!submission.is_valid());
        assert_eq!(submission.errors["contributions"], MONEY_SCALE_ERROR);
        assert!(create(&conn, admin, &submission).is_err());
        assert_eq!(Record::<ReportedTotals>::count(&conn).unwrap(), 0);

        // Trailing zeros are not extra precision
        let submission = parse_form(&conn, admin, &form(&[("contributions", "1.500")])).unwrap();
        assert!(submission.is_valid());
    }

    #[test]
    fn test_change_list_search_and_display() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("entity").unwrap();
        let individual = Category::create(&conn, CategoryKind::Entity, "individual").unwrap();
        let mut jane = Entity::named(Some(individual.id), "Doe");
        jane.first_name = "Jane".to_string();
        Record::create(&conn, jane).unwrap();
        Record::create(&conn, Entity::named(None, "Acme")).unwrap();

        let all = list(&conn, admin, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].cells, vec!["Acme", "", ""]);
        assert_eq!(all[1].cells, vec!["Doe", "Jane", "individual"]);

        let found = list(&conn, admin, Some("jan")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(admin.list_headers(), vec!["Last name", "First name", "Category"]);
    }

    #[test]
    fn test_category_admin() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("transactioncategory").unwrap();

        let submission = parse_form(&conn, admin, &form(&[("name", "contribution")])).unwrap();
        create(&conn, admin, &submission).unwrap();
        assert!(Category::find_by_name(&conn, CategoryKind::Transaction, "contribution")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_form_sections_mark_selection() {
        let conn = open_in_memory().unwrap();
        let admin = find_admin("entity").unwrap();
        let individual = Category::create(&conn, CategoryKind::Entity, "individual").unwrap();

        let mut errors = BTreeMap::new();
        errors.insert("last_name".to_string(), "This field is required.".to_string());
        let sections = form_sections(
            &conn,
            admin,
            &form(&[("category_id", &individual.id.to_string())]),
            &errors,
        )
        .unwrap();

        assert_eq!(sections.len(), admin.fieldsets.len());
        let category = &sections[0].fields[0];
        assert_eq!(category.widget, "select");
        assert!(category.choices[0].selected);

        let last_name = sections[1].fields.iter().find(|f| f.name == "last_name").unwrap();
        assert!(last_name.required);
        assert_eq!(last_name.error.as_deref(), Some("This field is required."));
    }
}
