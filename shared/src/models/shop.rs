//! Shop Product Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// Equipment class of a catalog listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCategory {
    Imaging,
    Monitoring,
    Laboratory,
    Surgical,
    Sterilization,
    Mobility,
    Consumables,
    #[default]
    Other,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imaging => "imaging",
            Self::Monitoring => "monitoring",
            Self::Laboratory => "laboratory",
            Self::Surgical => "surgical",
            Self::Sterilization => "sterilization",
            Self::Mobility => "mobility",
            Self::Consumables => "consumables",
            Self::Other => "other",
        }
    }
}

/// Physical condition of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCondition {
    #[default]
    New,
    Refurbished,
    UsedExcellent,
    UsedGood,
}

/// Role an image plays within a product listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductImageRole {
    #[default]
    Main,
    Gallery,
    Thumbnail,
}

/// Image attached to a product listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopProductImage {
    pub id: Uuid,
    pub url: String,
    pub role: ProductImageRole,
    pub alt_text: Option<String>,
    pub sort_order: i32,
}

/// Shop product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopProduct {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Pre-discount price for display; expected (not enforced) to exceed `price`
    pub original_price: Option<Decimal>,
    pub category: ProductCategory,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub condition: ProductCondition,
    pub in_stock: bool,
    pub stock_quantity: u32,
    /// Free-form specification table (label -> value)
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub warranty: Option<String>,
    pub featured: bool,
    pub images: Vec<ShopProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShopProduct {
    /// Discount percentage for display, when the original price exceeds
    /// the current price. Rounded to the nearest whole percent.
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.price || original.is_zero() {
            return None;
        }
        let ratio = (original - self.price) / original * Decimal::from(100);
        ratio.round().to_u32()
    }
}

/// Input for a product image row
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ShopProductImageDraft {
    #[validate(length(min = 1))]
    pub url: String,
    #[serde(default)]
    pub role: ProductImageRole,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Input payload for creating or fully replacing a product listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShopProductDraft {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub category: ProductCategory,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub condition: ProductCondition,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub warranty: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    #[validate(nested)]
    pub images: Vec<ShopProductImageDraft>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(price: i64, original: Option<i64>) -> ShopProduct {
        ShopProduct {
            id: Uuid::new_v4(),
            name: "Patient monitor".into(),
            description: String::new(),
            price: Decimal::from(price),
            original_price: original.map(Decimal::from),
            category: ProductCategory::Monitoring,
            brand: None,
            model: None,
            condition: ProductCondition::Refurbished,
            in_stock: true,
            stock_quantity: 2,
            specifications: BTreeMap::new(),
            features: vec![],
            tags: vec![],
            warranty: None,
            featured: false,
            images: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn discount_percent_rounds() {
        assert_eq!(product(750, Some(1000)).discount_percent(), Some(25));
        assert_eq!(product(667, Some(1000)).discount_percent(), Some(33));
    }

    #[test]
    fn no_discount_without_higher_original() {
        assert_eq!(product(1000, None).discount_percent(), None);
        assert_eq!(product(1000, Some(900)).discount_percent(), None);
        assert_eq!(product(1000, Some(1000)).discount_percent(), None);
    }

    #[test]
    fn condition_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ProductCondition::UsedExcellent).unwrap(),
            "\"used-excellent\""
        );
    }
}
