//! Seed data written when a storage key is missing.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use dashboard_core::{Email, IdentityId, RecordId, Role};

use crate::models::{Identity, ProductRecord, StoredIdentity, UserRecord};

/// Categories assigned to seeded products.
pub const PRODUCT_CATEGORIES: [&str; 5] = ["Electronics", "Clothing", "Home", "Books", "Food"];

/// Number of seeded products.
pub const SEED_PRODUCT_COUNT: usize = 10;

struct SeedAccount {
    id: &'static str,
    email: &'static str,
    display_name: &'static str,
    role: Role,
}

const SEED_ACCOUNTS: [SeedAccount; 2] = [
    SeedAccount {
        id: "admin123",
        email: "admin@example.com",
        display_name: "Admin User",
        role: Role::Admin,
    },
    SeedAccount {
        id: "user456",
        email: "user@example.com",
        display_name: "Regular User",
        role: Role::User,
    },
];

fn seed_email(account: &SeedAccount) -> Option<Email> {
    Email::parse(account.email).ok()
}

/// Seed records for the `users` collection.
#[must_use]
pub fn users(now: DateTime<Utc>) -> Vec<UserRecord> {
    SEED_ACCOUNTS
        .iter()
        .filter_map(|account| {
            Some(UserRecord {
                id: RecordId::new(account.id),
                email: seed_email(account)?,
                display_name: Some(account.display_name.to_owned()),
                photo_url: None,
                role: account.role,
                created_at: now,
                updated_at: None,
            })
        })
        .collect()
}

/// Seed identities for the session store.
///
/// `password_hash` is shared by both seed identities; without one they cannot
/// log in until a password is set.
#[must_use]
pub fn identities(now: DateTime<Utc>, password_hash: Option<&str>) -> Vec<StoredIdentity> {
    SEED_ACCOUNTS
        .iter()
        .map(|account| StoredIdentity {
            identity: Identity {
                uid: IdentityId::new(account.id),
                email: seed_email(account),
                display_name: Some(account.display_name.to_owned()),
                photo_url: None,
                role: account.role,
                created_at: now,
            },
            password_hash: password_hash.map(str::to_owned),
        })
        .collect()
}

/// Seed records for the `products` collection.
///
/// Prices are uniform in `0.00..=99.99`, about four in five products are in
/// stock, and creation dates fall within the 90 days before `now`.
pub fn products<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<ProductRecord> {
    (1..=SEED_PRODUCT_COUNT)
        .map(|n| {
            let cents: i64 = rng.random_range(0..10_000);
            let category = PRODUCT_CATEGORIES[rng.random_range(0..PRODUCT_CATEGORIES.len())];
            let age_days: i64 = rng.random_range(0..90);

            ProductRecord {
                id: RecordId::new(format!("product_{n}")),
                name: format!("Product {n}"),
                description: "Lorem ipsum dolor sit amet, consectetur adipiscing elit.".to_owned(),
                price: Decimal::new(cents, 2),
                image_url: Some(format!("https://picsum.photos/seed/product{n}/200/200")),
                category: Some(category.to_owned()),
                in_stock: rng.random_bool(0.8),
                created_at: now - Duration::days(age_days),
                updated_at: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_seed_users_match_identities() {
        let now = Utc::now();
        let users = users(now);
        let identities = identities(now, None);

        assert_eq!(users.len(), 2);
        assert_eq!(identities.len(), 2);
        for (user, stored) in users.iter().zip(&identities) {
            assert_eq!(user.id.as_str(), stored.identity.uid.as_str());
            assert_eq!(Some(&user.email), stored.identity.email.as_ref());
            assert_eq!(user.role, stored.identity.role);
            assert!(stored.password_hash.is_none());
        }
        assert_eq!(users[0].role, Role::Admin);
    }

    #[test]
    fn test_seed_products_ranges() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(7);
        let products = products(&mut rng, now);

        assert_eq!(products.len(), SEED_PRODUCT_COUNT);
        assert_eq!(products[0].id.as_str(), "product_1");
        assert_eq!(products[9].id.as_str(), "product_10");
        for product in &products {
            assert!(product.price >= Decimal::ZERO);
            assert!(product.price <= Decimal::new(9999, 2));
            assert!(PRODUCT_CATEGORIES.contains(&product.category.as_deref().unwrap_or("")));
            assert!(product.created_at <= now);
            assert!(product.created_at > now - Duration::days(90));
        }
    }
}
