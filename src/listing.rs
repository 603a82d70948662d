// 🔎 Listing options - label tables behind the list pages' filter and sort controls
//
// Each list page owns two static tables:
// - filter_categories: UI label -> category name (None = no filter)
// - sort_by_fields:    UI label -> sort keys ("column" or "-column")
//
// Only these compile-time strings ever reach the SQL text; request values are
// used as lookup keys.

use crate::error::{Error, Result};
use crate::models::{Category, CategoryKind, Record, Table};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Query string of a list page (`?category=...&sortby=...`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub sortby: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ListingOptions {
    pub category_kind: Option<CategoryKind>,
    pub filter_categories: &'static [(&'static str, Option<&'static str>)],
    pub sort_by_fields: &'static [(&'static str, &'static [&'static str])],
    /// Sort label applied when the request names none
    pub default_sort: &'static str,
}

// ============================================================================
// OPTION TABLES
// ============================================================================

pub const ENTITY: ListingOptions = ListingOptions {
    category_kind: Some(CategoryKind::Entity),
    filter_categories: &[
        ("select", None),
        ("person", Some("individual")),
        ("company", Some("corporation")),
        ("religious", Some("religious")),
        ("government", Some("government")),
        ("committee", Some("committee")),
    ],
    sort_by_fields: &[
        ("select", &["last_name"]),
        ("first name", &["first_name"]),
        ("last name", &["last_name"]),
        ("industry", &["industry_id"]),
    ],
    default_sort: "last name",
};

pub const RELATIONSHIP: ListingOptions = ListingOptions {
    category_kind: Some(CategoryKind::Relationship),
    filter_categories: &[
        ("select", None),
        ("spouse", Some("spouse")),
        ("employer", Some("employer")),
        ("family", Some("family")),
        ("owner", Some("owner")),
    ],
    sort_by_fields: &[
        ("select", &["category_id"]),
        ("category", &["category_id"]),
        ("member 1", &["parent_entity_id"]),
        ("member 2", &["child_entity_id"]),
    ],
    default_sort: "category",
};

pub const CAMPAIGN: ListingOptions = ListingOptions {
    category_kind: Some(CategoryKind::Campaign),
    filter_categories: &[
        ("select category", None),
        ("candidate", Some("candidate")),
        ("recall", Some("recall")),
        ("ballot initiative", Some("ballot initiative")),
    ],
    sort_by_fields: &[
        ("select", &["name"]),
        ("name", &["name"]),
        ("date", &["registration_date"]),
        ("office", &["office_sought_id"]),
    ],
    default_sort: "name",
};

pub const OFFICE: ListingOptions = ListingOptions {
    category_kind: None,
    filter_categories: &[],
    sort_by_fields: &[
        ("select", &["name"]),
        ("title", &["name"]),
        ("government", &["government_entity_id"]),
        ("current office holder", &["holder_entity_id"]),
    ],
    default_sort: "title",
};

pub const FORMER_OFFICE_HOLDER: ListingOptions = ListingOptions {
    category_kind: None,
    filter_categories: &[],
    sort_by_fields: &[
        ("select", &["office_id"]),
        ("office", &["office_id"]),
        ("former holder", &["entity_id"]),
    ],
    default_sort: "office",
};

pub const ELECTION: ListingOptions = ListingOptions {
    category_kind: Some(CategoryKind::Election),
    filter_categories: &[
        ("select", None),
        ("primary", Some("primary")),
        ("runoff", Some("runoff")),
        ("general", Some("general")),
    ],
    sort_by_fields: &[
        ("select", &["-date"]),
        ("date", &["-date"]),
        ("government juridiction", &["government_entity_id"]),
    ],
    default_sort: "date",
};

pub const DOCUMENT: ListingOptions = ListingOptions {
    category_kind: None,
    filter_categories: &[],
    sort_by_fields: &[
        ("select", &["-date_filed"]),
        ("name", &["name"]),
        ("date", &["date_filed"]),
        ("coverage start", &["coverage_start_date"]),
        ("coverage end", &["coverage_end_date"]),
    ],
    default_sort: "date",
};

pub const TRANSACTION: ListingOptions = ListingOptions {
    category_kind: Some(CategoryKind::Transaction),
    filter_categories: &[
        ("select category", None),
        ("contribution", Some("contribution")),
        ("expenditure", Some("expenditure")),
        ("refund", Some("refund")),
        ("loan", Some("loan")),
        ("in kind", Some("inkind")),
    ],
    sort_by_fields: &[
        ("select", &["-recorded_date"]),
        ("payer", &["payer_entity_id"]),
        ("recipient", &["payee_entity_id"]),
        ("date", &["recorded_date"]),
        ("amount", &["amount"]),
    ],
    default_sort: "date",
};

pub const ADDRESS: ListingOptions = ListingOptions {
    category_kind: Some(CategoryKind::Address),
    filter_categories: &[
        ("select category", None),
        ("p.o. box", Some("po box")),
        ("building", Some("building")),
    ],
    sort_by_fields: &[
        ("select", &["street_name"]),
        ("street", &["street_name"]),
        ("city", &["city_name"]),
        ("state", &["state_name"]),
        ("zip code", &["zip_code"]),
    ],
    default_sort: "street",
};

pub const PHONE_NUMBER: ListingOptions = ListingOptions {
    category_kind: None,
    filter_categories: &[],
    sort_by_fields: &[
        ("select", &["area_code", "number"]),
        ("phone number", &["area_code"]),
        ("owner", &["owner_id"]),
    ],
    default_sort: "phone number",
};

pub const EMAIL: ListingOptions = ListingOptions {
    category_kind: None,
    filter_categories: &[],
    sort_by_fields: &[
        ("select", &["address"]),
        ("address", &["address"]),
        ("owner", &["owner_id"]),
    ],
    default_sort: "address",
};

/// Every filterable listing, for seeding the category names it refers to
pub const FILTERED: [ListingOptions; 6] = [ENTITY, RELATIONSHIP, CAMPAIGN, ELECTION, TRANSACTION, ADDRESS];

// ============================================================================
// RESOLUTION
// ============================================================================

/// ORDER BY text for sort keys, ties broken by id
pub fn order_clause(keys: &[&str]) -> String {
    let mut terms: Vec<String> = keys
        .iter()
        .map(|key| match key.strip_prefix('-') {
            Some(column) => format!("{column} DESC"),
            None => key.to_string(),
        })
        .collect();
    terms.push("id".to_string());
    terms.join(", ")
}

impl ListingOptions {
    /// Category name for a filter label; unknown or missing labels mean no filter
    pub fn resolve_category(&self, label: Option<&str>) -> Option<&'static str> {
        let label = label?;
        self.filter_categories
            .iter()
            .find(|(l, _)| *l == label)
            .and_then(|(_, name)| *name)
    }

    /// Sort keys for a sort label; a missing label falls back to the default
    pub fn resolve_sort(&self, label: Option<&str>) -> Result<&'static [&'static str]> {
        let label = label.unwrap_or(self.default_sort);
        self.sort_by_fields
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, keys)| *keys)
            .ok_or_else(|| Error::UnknownSortOption(label.to_string()))
    }

    pub fn filter_labels(&self) -> Vec<&'static str> {
        self.filter_categories.iter().map(|(label, _)| *label).collect()
    }

    pub fn sort_labels(&self) -> Vec<&'static str> {
        self.sort_by_fields.iter().map(|(label, _)| *label).collect()
    }

    /// Category names the filter table refers to
    pub fn category_names(&self) -> Vec<&'static str> {
        self.filter_categories.iter().filter_map(|(_, name)| *name).collect()
    }

    /// Run the listing query for a request's labels
    pub fn query<T: Table>(&self, conn: &Connection, query: &ListingQuery) -> Result<Vec<Record<T>>> {
        let order = order_clause(self.resolve_sort(query.sortby.as_deref())?);

        let category_name = self.resolve_category(query.category.as_deref());
        match (self.category_kind, category_name) {
            (Some(kind), Some(name)) => match Category::find_by_name(conn, kind, name)? {
                Some(category) => Record::<T>::filter(conn, "category_id = ?1", [category.id], &order),
                None => {
                    tracing::debug!(table = T::TABLE, category = name, "filter category missing");
                    Ok(Vec::new())
                }
            },
            _ => Record::<T>::all(conn, &order),
        }
    }
}
