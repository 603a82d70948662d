// 🌱 Seed - category names the listings and admin pickers look up by name

use crate::admin::ADMINS;
use crate::error::Result;
use crate::listing::FILTERED;
use crate::models::{Category, CategoryKind};
use rusqlite::Connection;

/// Every (kind, name) the application refers to by name
pub fn known_categories() -> Vec<(CategoryKind, &'static str)> {
    let mut names = Vec::new();

    for options in FILTERED {
        if let Some(kind) = options.category_kind {
            names.extend(options.category_names().into_iter().map(|name| (kind, name)));
        }
    }
    for admin in ADMINS {
        names.extend(admin.entity_categories.iter().map(|(_, name)| (CategoryKind::Entity, *name)));
    }

    names.sort_by_key(|(kind, name)| (kind.table(), *name));
    names.dedup();
    names
}

/// Create the missing ones; returns how many were created
pub fn seed_categories(conn: &Connection) -> Result<usize> {
    let mut created = 0;
    for (kind, name) in known_categories() {
        if Category::find_by_name(conn, kind, name)?.is_none() {
            Category::create(conn, kind, name)?;
            tracing::debug!(kind = kind.as_str(), name, "seeded category");
            created += 1;
        }
    }
    tracing::info!(created, "category seed complete");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::open_in_memory;

    #[test]
    fn test_seed_is_idempotent() {
        let conn = open_in_memory().unwrap();

        let first = seed_categories(&conn).unwrap();
        assert_eq!(first, known_categories().len());
        assert_eq!(seed_categories(&conn).unwrap(), 0);
    }

    #[test]
    fn test_seed_covers_listings_and_pickers() {
        let conn = open_in_memory().unwrap();
        seed_categories(&conn).unwrap();

        for (kind, name) in [
            (CategoryKind::Entity, "individual"),
            (CategoryKind::Entity, "government"),
            (CategoryKind::Transaction, "inkind"),
            (CategoryKind::Address, "po box"),
            (CategoryKind::Campaign, "ballot initiative"),
        ] {
            assert!(Category::find_by_name(&conn, kind, name).unwrap().is_some(), "{name}");
        }
        // "individual" appears in both the entity listing and the pickers
        assert_eq!(Category::list(&conn, CategoryKind::Entity).unwrap().len(), 5);
    }
}
