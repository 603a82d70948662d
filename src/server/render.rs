// 🖼️ Templates - embedded tera templates and the site's display filters

use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use tera::{Context, Tera, Value};

macro_rules! templates {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../../web/templates/", $name)))),*]
    };
}

const TEMPLATES: &[(&str, &str)] = templates![
    "base.html",
    "macros.html",
    "index.html",
    "glossary.html",
    "entity_list.html",
    "entity_detail.html",
    "industrysector_list.html",
    "industrysector_detail.html",
    "industry_list.html",
    "externalid_list.html",
    "externalid_detail.html",
    "relationship_list.html",
    "relationship_detail.html",
    "campaign_list.html",
    "campaign_detail.html",
    "office_list.html",
    "office_detail.html",
    "formerofficeholder_list.html",
    "election_list.html",
    "election_detail.html",
    "document_list.html",
    "document_detail.html",
    "reportedtotals_list.html",
    "reportedtotals_detail.html",
    "reportedsubtotals_list.html",
    "reportedsubtotals_detail.html",
    "transaction_list.html",
    "transaction_detail.html",
    "address_list.html",
    "address_detail.html",
    "phonenumber_list.html",
    "phonenumber_detail.html",
    "email_list.html",
    "email_detail.html",
    "website_list.html",
    "website_detail.html",
    "assumedname_list.html",
    "assumedname_detail.html",
    "admin/index.html",
    "admin/list.html",
    "admin/form.html",
];

/// Parse every embedded template and register the filters
pub fn templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    tera.register_filter("ap_date", ap_date);
    tera.register_filter("currency", currency);
    Ok(tera)
}

pub fn render(tera: &Tera, name: &str, context: &impl Serialize) -> Result<String> {
    let context = Context::from_serialize(context)?;
    Ok(tera.render(name, &context)?)
}

// ============================================================================
// FILTERS
// ============================================================================

/// Associated Press month style
const AP_MONTHS: [&str; 12] = [
    "Jan.", "Feb.", "March", "April", "May", "June", "July", "Aug.", "Sept.", "Oct.", "Nov.", "Dec.",
];

pub fn format_ap_date(date: NaiveDate) -> String {
    format!("{} {}, {}", AP_MONTHS[date.month0() as usize], date.day(), date.year())
}

pub fn format_currency(amount: Decimal) -> String {
    let mut cents = amount.round_dp(2);
    cents.rescale(2);
    if cents.is_sign_negative() && !cents.is_zero() {
        format!("-${}", cents.abs())
    } else {
        format!("${}", cents.abs())
    }
}

/// `{{ date | ap_date }}`: "2023-01-01" -> "Jan. 1, 2023"; null -> ""
pub fn ap_date(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::Null => Ok(Value::String(String::new())),
        Value::String(text) => {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|_| tera::Error::msg(format!("ap_date: not a date: {text}")))?;
            Ok(Value::String(format_ap_date(date)))
        }
        _ => Err(tera::Error::msg("ap_date filter requires a date string")),
    }
}

/// `{{ amount | currency }}`: "12.3" -> "$12.30"
pub fn currency(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = match value {
        Value::String(text) => Decimal::from_str(text).ok(),
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        _ => None,
    };
    amount
        .map(|amount| Value::String(format_currency(amount)))
        .ok_or_else(|| tera::Error::msg("currency filter requires a decimal"))
}
