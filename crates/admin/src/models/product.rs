//! The `products` record collection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dashboard_core::{Field, FieldKind, FieldValue, RecordId};

use super::entity::{Collection, Entity, ValidationError};

/// A product in the catalog.
///
/// Prices are decimals in memory and plain JSON numbers on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Queryable fields of [`ProductRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Id,
    Name,
    Description,
    Price,
    ImageUrl,
    Category,
    InStock,
    CreatedAt,
    UpdatedAt,
}

impl Field for ProductField {
    const ALL: &'static [Self] = &[
        Self::Id,
        Self::Name,
        Self::Description,
        Self::Price,
        Self::ImageUrl,
        Self::Category,
        Self::InStock,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    const SEARCHABLE: &'static [Self] = &[Self::Name, Self::Description, Self::Category];

    fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Description => "description",
            Self::Price => "price",
            Self::ImageUrl => "imageUrl",
            Self::Category => "category",
            Self::InStock => "inStock",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::Price => FieldKind::Number,
            Self::InStock => FieldKind::Bool,
            Self::CreatedAt | Self::UpdatedAt => FieldKind::Timestamp,
            Self::Id | Self::Name | Self::Description | Self::ImageUrl | Self::Category => {
                FieldKind::Text
            }
        }
    }
}

const fn default_in_stock() -> bool {
    true
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

/// Partial update of a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub in_stock: Option<bool>,
}

/// CSV row for a product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductExport {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: Option<String>,
    pub in_stock: &'static str,
    pub created_at: DateTime<Utc>,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    Ok(())
}

/// Highest price a product may carry.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("price", "must not be negative"));
    }
    if price > MAX_PRICE {
        return Err(ValidationError::new("price", "must be at most 1000000000"));
    }
    Ok(())
}

impl Entity for ProductRecord {
    type Field = ProductField;
    type Draft = NewProduct;
    type Patch = ProductPatch;
    type Export = ProductExport;

    const COLLECTION: Collection = Collection::Products;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn draft_id(draft: &NewProduct) -> Option<&RecordId> {
        draft.id.as_ref().filter(|id| !id.is_empty())
    }

    fn from_draft(draft: NewProduct, id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            description: draft.description,
            price: draft.price,
            image_url: draft.image_url,
            category: draft.category,
            in_stock: draft.in_stock,
            created_at: now,
            updated_at: Some(now),
        }
    }

    fn apply_patch(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_owned();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(in_stock) = patch.in_stock {
            self.in_stock = in_stock;
        }
    }

    fn validate_draft(draft: &NewProduct) -> Result<(), ValidationError> {
        validate_name(&draft.name)?;
        validate_price(draft.price)
    }

    fn validate_patch(patch: &ProductPatch) -> Result<(), ValidationError> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        patch.price.map_or(Ok(()), validate_price)
    }

    fn field(&self, field: ProductField) -> FieldValue {
        match field {
            ProductField::Id => self.id.as_str().into(),
            ProductField::Name => self.name.as_str().into(),
            ProductField::Description => self.description.as_str().into(),
            ProductField::Price => self.price.into(),
            ProductField::ImageUrl => self.image_url.as_deref().into(),
            ProductField::Category => self.category.as_deref().into(),
            ProductField::InStock => self.in_stock.into(),
            ProductField::CreatedAt => self.created_at.into(),
            ProductField::UpdatedAt => self.updated_at.into(),
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn to_export(&self) -> ProductExport {
        ProductExport {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            category: self.category.clone(),
            in_stock: if self.in_stock { "Yes" } else { "No" },
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> ProductRecord {
        ProductRecord {
            id: RecordId::new("product_1"),
            name: "Product 1".to_string(),
            description: "Description for product 1".to_string(),
            price: Decimal::new(1999, 2),
            image_url: None,
            category: Some("Electronics".to_string()),
            in_stock: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_price_is_a_json_number() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value["price"].is_number());
        assert_eq!(value["inStock"], true);

        let back: ProductRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.price, Decimal::new(1999, 2));
    }

    #[test]
    fn test_new_product_defaults_in_stock() {
        let draft: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "Lamp",
            "price": 12.5,
        }))
        .unwrap();
        assert!(draft.in_stock);
        assert!(draft.description.is_empty());
        assert!(ProductRecord::validate_draft(&draft).is_ok());
    }

    #[test]
    fn test_validation_rejects_blank_name_and_negative_price() {
        let draft: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "  ",
            "price": 1,
        }))
        .unwrap();
        assert_eq!(ProductRecord::validate_draft(&draft).unwrap_err().field, "name");

        let patch = ProductPatch {
            price: Some(Decimal::new(-1, 0)),
            ..ProductPatch::default()
        };
        assert_eq!(ProductRecord::validate_patch(&patch).unwrap_err().field, "price");
    }

    #[test]
    fn test_validation_caps_price() {
        let draft: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "Huge",
            "price": 7e28,
        }))
        .unwrap();
        assert_eq!(ProductRecord::validate_draft(&draft).unwrap_err().field, "price");

        let at_cap = ProductPatch {
            price: Some(MAX_PRICE),
            ..ProductPatch::default()
        };
        assert!(ProductRecord::validate_patch(&at_cap).is_ok());
    }

    #[test]
    fn test_patch_price_is_optional() {
        let patch: ProductPatch =
            serde_json::from_value(serde_json::json!({ "inStock": false })).unwrap();
        assert!(patch.price.is_none());

        let mut product = sample();
        product.apply_patch(patch);
        assert!(!product.in_stock);
        assert_eq!(product.price, Decimal::new(1999, 2));
    }

    #[test]
    fn test_export_formats_stock_flag() {
        let mut product = sample();
        assert_eq!(product.to_export().in_stock, "Yes");
        product.in_stock = false;
        assert_eq!(product.to_export().in_stock, "No");
    }

    #[test]
    fn test_search_covers_category() {
        assert!(sample().matches_search("electro"));
        assert!(!sample().matches_search("clothing"));
    }
}
