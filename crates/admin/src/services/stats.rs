//! Dashboard and report figures computed from the record store.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use dashboard_core::Role;

use crate::db::{RecordStore, RepositoryError};
use crate::models::{ProductRecord, UserRecord};

/// Headline numbers for the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub admin_users: usize,
    pub total_products: usize,
    pub in_stock_products: usize,
    /// Sum of all product prices, saturating at `Decimal::MAX`.
    #[serde(with = "rust_decimal::serde::float")]
    pub catalog_value: Decimal,
}

/// Breakdowns shown on the reports page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    /// Products per category; uncategorised products are counted under "Uncategorized".
    pub products_by_category: BTreeMap<String, usize>,
    pub users_by_role: BTreeMap<Role, usize>,
    pub in_stock: usize,
    pub out_of_stock: usize,
}

const UNCATEGORIZED: &str = "Uncategorized";

/// Compute the dashboard headline numbers.
///
/// # Errors
///
/// Returns `RepositoryError::Poisoned` if a collection lock is poisoned.
pub fn dashboard(store: &RecordStore) -> Result<DashboardStats, RepositoryError> {
    let users = store.all::<UserRecord>()?;
    let products = store.all::<ProductRecord>()?;

    Ok(DashboardStats {
        total_users: users.len(),
        admin_users: users.iter().filter(|u| u.role.is_admin()).count(),
        total_products: products.len(),
        in_stock_products: products.iter().filter(|p| p.in_stock).count(),
        catalog_value: products
            .iter()
            .fold(Decimal::ZERO, |total, p| total.saturating_add(p.price)),
    })
}

/// Compute the report breakdowns.
///
/// # Errors
///
/// Returns `RepositoryError::Poisoned` if a collection lock is poisoned.
pub fn reports(store: &RecordStore) -> Result<ReportStats, RepositoryError> {
    let users = store.all::<UserRecord>()?;
    let products = store.all::<ProductRecord>()?;

    let mut products_by_category = BTreeMap::new();
    for product in &products {
        let category = product
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        *products_by_category.entry(category.to_owned()).or_insert(0) += 1;
    }

    let mut users_by_role: BTreeMap<Role, usize> = Role::ALL.iter().map(|&r| (r, 0)).collect();
    for user in &users {
        *users_by_role.entry(user.role).or_insert(0) += 1;
    }

    let in_stock = products.iter().filter(|p| p.in_stock).count();
    Ok(ReportStats {
        products_by_category,
        users_by_role,
        in_stock,
        out_of_stock: products.len() - in_stock,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::Entity;
    use crate::storage::{MemoryStorage, Storage};

    #[test]
    fn test_dashboard_counts_seed_data() {
        let store = RecordStore::open(Arc::new(MemoryStorage::new())).unwrap();
        let stats = dashboard(&store).unwrap();

        let products = store.all::<ProductRecord>().unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.admin_users, 1);
        assert_eq!(stats.total_products, 10);
        assert_eq!(
            stats.catalog_value,
            products.iter().map(|p| p.price).sum::<Decimal>()
        );
    }

    #[test]
    fn test_catalog_value_saturates_on_stored_huge_prices() {
        let storage = Arc::new(MemoryStorage::new());
        let store = RecordStore::open(storage.clone()).unwrap();
        let mut products = store.all::<ProductRecord>().unwrap();
        let huge_price = Decimal::from_parts(0, 0, 3_794_707_603, false, 0);
        let mut huge = products[0].clone();
        huge.price = huge_price;
        products[0].price = huge_price;
        huge.id = dashboard_core::RecordId::new("huge_2");
        products.push(huge);
        storage
            .set(
                ProductRecord::COLLECTION.storage_key(),
                &serde_json::to_string(&products).unwrap(),
            )
            .unwrap();

        let reopened = RecordStore::open(storage).unwrap();
        let stats = dashboard(&reopened).unwrap();
        assert_eq!(stats.total_products, 11);
        assert_eq!(stats.catalog_value, Decimal::MAX);
    }

    #[test]
    fn test_reports_breakdowns_add_up() {
        let store = RecordStore::open(Arc::new(MemoryStorage::new())).unwrap();
        let report = reports(&store).unwrap();

        assert_eq!(report.products_by_category.values().sum::<usize>(), 10);
        assert_eq!(report.in_stock + report.out_of_stock, 10);
        assert_eq!(report.users_by_role[&Role::Admin], 1);
        assert_eq!(report.users_by_role[&Role::User], 1);
    }
}
