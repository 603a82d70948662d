// 📄 Filed documents and the totals reported on them
//
// Each document has at most one `ReportedTotals` row and one
// `ReportedSubtotals` row (document_id is UNIQUE on both).

use crate::error::Result;
use crate::models::category::CategoryKind;
use crate::models::{date_value, decimal_to_cents, money, Field, Record, Table, Target};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

// ============================================================================
// DOCUMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub category_id: Option<i64>,
    pub name: String,
    pub filer_entity_id: Option<i64>,
    pub officer_oath_entity_id: Option<i64>,
    pub date_filed: NaiveDate,
    pub coverage_start_date: NaiveDate,
    pub coverage_end_date: NaiveDate,
    pub uploaded_file: String,
    pub notes: String,
}

impl Document {
    pub fn new(name: &str, date_filed: NaiveDate, coverage_start_date: NaiveDate, coverage_end_date: NaiveDate) -> Self {
        Document {
            category_id: None,
            name: name.to_string(),
            filer_entity_id: None,
            officer_oath_entity_id: None,
            date_filed,
            coverage_start_date,
            coverage_end_date,
            uploaded_file: String::new(),
            notes: String::new(),
        }
    }
}

impl Table for Document {
    const TABLE: &'static str = "documents";
    const KIND: &'static str = "document";
    const FIELDS: &'static [Field] = &[
        Field::category(CategoryKind::Document),
        Field::required_text("name", "Name", 1000),
        Field::link("filer_entity_id", "Filer", Target::Entity),
        Field::link("officer_oath_entity_id", "Officer oath", Target::Entity),
        Field::date("date_filed", "Date filed", true),
        Field::date("coverage_start_date", "Coverage start", true),
        Field::date("coverage_end_date", "Coverage end", true),
        Field::file("uploaded_file", "Uploaded file"),
        Field::notes(),
    ];

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.name.clone().into(),
            self.filer_entity_id.into(),
            self.officer_oath_entity_id.into(),
            date_value(self.date_filed),
            date_value(self.coverage_start_date),
            date_value(self.coverage_end_date),
            self.uploaded_file.clone().into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Document {
            category_id: row.get(offset)?,
            name: row.get(offset + 1)?,
            filer_entity_id: row.get(offset + 2)?,
            officer_oath_entity_id: row.get(offset + 3)?,
            date_filed: row.get(offset + 4)?,
            coverage_start_date: row.get(offset + 5)?,
            coverage_end_date: row.get(offset + 6)?,
            uploaded_file: row.get(offset + 7)?,
            notes: row.get(offset + 8)?,
        })
    }
}

impl Record<Document> {
    /// Documents the entity filed or swore the officer oath on
    pub fn involving(conn: &Connection, entity_id: i64) -> Result<Vec<Self>> {
        Self::filter(
            conn,
            "filer_entity_id = ?1 OR officer_oath_entity_id = ?1",
            [entity_id],
            "date_filed DESC, id",
        )
    }

    pub fn totals(&self, conn: &Connection) -> Result<Option<Record<ReportedTotals>>> {
        Ok(Record::<ReportedTotals>::filter(conn, "document_id = ?1", [self.id], "id")?
            .into_iter()
            .next())
    }

    pub fn subtotals(&self, conn: &Connection) -> Result<Option<Record<ReportedSubtotals>>> {
        Ok(Record::<ReportedSubtotals>::filter(conn, "document_id = ?1", [self.id], "id")?
            .into_iter()
            .next())
    }
}

// ============================================================================
// REPORTED TOTALS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportedTotals {
    pub document_id: Option<i64>,
    pub unitemized_contributions: Decimal,
    pub contributions: Decimal,
    pub unitemized_expenditures: Decimal,
    pub expenditures: Decimal,
    pub maintained_contributions: Decimal,
    pub principal_outstanding_loans: Decimal,
}

impl Table for ReportedTotals {
    const TABLE: &'static str = "reported_totals";
    const KIND: &'static str = "reported totals";
    const FIELDS: &'static [Field] = &[
        Field::link("document_id", "Document", Target::Document),
        Field::money("unitemized_contributions", "Unitemized political contributions"),
        Field::money("contributions", "Total political contributions"),
        Field::money("unitemized_expenditures", "Unitemized political expenditures"),
        Field::money("expenditures", "Total political expenditures"),
        Field::money("maintained_contributions", "Total contributions maintained"),
        Field::money("principal_outstanding_loans", "Total principal amount of all outstanding loans"),
    ];

    fn money_values(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("unitemized_contributions", self.unitemized_contributions),
            ("contributions", self.contributions),
            ("unitemized_expenditures", self.unitemized_expenditures),
            ("expenditures", self.expenditures),
            ("maintained_contributions", self.maintained_contributions),
            ("principal_outstanding_loans", self.principal_outstanding_loans),
        ]
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.document_id.into(),
            Value::Integer(decimal_to_cents(self.unitemized_contributions)),
            Value::Integer(decimal_to_cents(self.contributions)),
            Value::Integer(decimal_to_cents(self.unitemized_expenditures)),
            Value::Integer(decimal_to_cents(self.expenditures)),
            Value::Integer(decimal_to_cents(self.maintained_contributions)),
            Value::Integer(decimal_to_cents(self.principal_outstanding_loans)),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(ReportedTotals {
            document_id: row.get(offset)?,
            unitemized_contributions: money(row, offset + 1)?,
            contributions: money(row, offset + 2)?,
            unitemized_expenditures: money(row, offset + 3)?,
            expenditures: money(row, offset + 4)?,
            maintained_contributions: money(row, offset + 5)?,
            principal_outstanding_loans: money(row, offset + 6)?,
        })
    }
}

// ============================================================================
// REPORTED SUBTOTALS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportedSubtotals {
    pub document_id: Option<i64>,
    pub monetary_political_contributions: Decimal,
    pub non_monetary_political_contributions: Decimal,
    pub pledged_contributions: Decimal,
    pub monetary_corporate_labor_contributions: Decimal,
    pub non_monetary_corporate_labor_contributions: Decimal,
    pub pledged_corporate_labor_contributions: Decimal,
    pub loans: Decimal,
    pub expenditures_from_contributions: Decimal,
    pub unpaid_incurred_obligations: Decimal,
    pub purchased_investments_with_contributions: Decimal,
    pub expenditures_credit_card: Decimal,
    pub expenditures_personal_funds: Decimal,
    pub expenditures_from_contributions_candidate_business: Decimal,
    pub expenditures_non_political_from_contributions: Decimal,
    pub interest_credit_gains_refunds_contributions_returned: Decimal,
}

impl ReportedSubtotals {
    fn amounts(&self) -> [Decimal; 15] {
        [
            self.monetary_political_contributions,
            self.non_monetary_political_contributions,
            self.pledged_contributions,
            self.monetary_corporate_labor_contributions,
            self.non_monetary_corporate_labor_contributions,
            self.pledged_corporate_labor_contributions,
            self.loans,
            self.expenditures_from_contributions,
            self.unpaid_incurred_obligations,
            self.purchased_investments_with_contributions,
            self.expenditures_credit_card,
            self.expenditures_personal_funds,
            self.expenditures_from_contributions_candidate_business,
            self.expenditures_non_political_from_contributions,
            self.interest_credit_gains_refunds_contributions_returned,
        ]
    }
}

impl Table for ReportedSubtotals {
    const TABLE: &'static str = "reported_subtotals";
    const KIND: &'static str = "reported subtotals";
    const FIELDS: &'static [Field] = &[
        Field::link("document_id", "Document", Target::Document),
        Field::money("monetary_political_contributions", "Monetary political contributions"),
        Field::money("non_monetary_political_contributions", "Non-monetary political contributions"),
        Field::money("pledged_contributions", "Pledged contributions"),
        Field::money("monetary_corporate_labor_contributions", "Monetary corporate/labor contributions"),
        Field::money("non_monetary_corporate_labor_contributions", "Non-monetary corporate/labor contributions"),
        Field::money("pledged_corporate_labor_contributions", "Pledged corporate/labor contributions"),
        Field::money("loans", "Loans"),
        Field::money("expenditures_from_contributions", "Expenditures from political contributions"),
        Field::money("unpaid_incurred_obligations", "Unpaid incurred obligations"),
        Field::money("purchased_investments_with_contributions", "Investments purchased with political contributions"),
        Field::money("expenditures_credit_card", "Expenditures made by credit card"),
        Field::money("expenditures_personal_funds", "Expenditures made from personal funds"),
        Field::money(
            "expenditures_from_contributions_candidate_business",
            "Expenditures from contributions to a candidate's business",
        ),
        Field::money(
            "expenditures_non_political_from_contributions",
            "Non-political expenditures from political contributions",
        ),
        Field::money(
            "interest_credit_gains_refunds_contributions_returned",
            "Interest, credits, gains, refunds, and contributions returned",
        ),
    ];

    fn money_values(&self) -> Vec<(&'static str, Decimal)> {
        Self::FIELDS[1..]
            .iter()
            .map(|field| field.column)
            .zip(self.amounts())
            .collect()
    }

    fn to_values(&self) -> Vec<Value> {
        let mut values = vec![Value::from(self.document_id)];
        values.extend(
            self.amounts()
                .into_iter()
                .map(|amount| Value::Integer(decimal_to_cents(amount))),
        );
        values
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(ReportedSubtotals {
            document_id: row.get(offset)?,
            monetary_political_contributions: money(row, offset + 1)?,
            non_monetary_political_contributions: money(row, offset + 2)?,
            pledged_contributions: money(row, offset + 3)?,
            monetary_corporate_labor_contributions: money(row, offset + 4)?,
            non_monetary_corporate_labor_contributions: money(row, offset + 5)?,
            pledged_corporate_labor_contributions: money(row, offset + 6)?,
            loans: money(row, offset + 7)?,
            expenditures_from_contributions: money(row, offset + 8)?,
            unpaid_incurred_obligations: money(row, offset + 9)?,
            purchased_investments_with_contributions: money(row, offset + 10)?,
            expenditures_credit_card: money(row, offset + 11)?,
            expenditures_personal_funds: money(row, offset + 12)?,
            expenditures_from_contributions_candidate_business: money(row, offset + 13)?,
            expenditures_non_political_from_contributions: money(row, offset + 14)?,
            interest_credit_gains_refunds_contributions_returned: money(row, offset + 15)?,
        })
    }
}
