use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UnknownVariant;
use crate::store::Record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    OutOfStock,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "out_of_stock" => Ok(ProductStatus::OutOfStock),
            _ => Err(UnknownVariant::new("product status", s)),
        }
    }
}

/// Product fields as they travel through CSV and the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    pub unit: String,
    #[serde(default)]
    pub status: ProductStatus,
    pub category_id: Uuid,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub version: i64,
    pub seller_id: Uuid,

    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    pub unit: String,
    pub status: ProductStatus,
    pub category_id: Uuid,
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(seller_id: Uuid, row: ProductRow, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 1,
            seller_id,
            name: row.name,
            sku: row.sku,
            price: row.price,
            stock: row.stock,
            unit: row.unit,
            status: row.status,
            category_id: row.category_id,
            description: row.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields, bumping the version
    pub fn revise(&mut self, row: ProductRow, now: DateTime<Utc>) {
        self.name = row.name;
        self.sku = row.sku;
        self.price = row.price;
        self.stock = row.stock;
        self.unit = row.unit;
        self.status = row.status;
        self.category_id = row.category_id;
        self.description = row.description;
        self.updated_at = now;
        self.version += 1;
    }

    pub fn to_row(&self) -> ProductRow {
        ProductRow {
            name: self.name.clone(),
            sku: self.sku.clone(),
            price: self.price,
            stock: self.stock,
            unit: self.unit.clone(),
            status: self.status,
            category_id: self.category_id,
            description: self.description.clone(),
        }
    }

    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Active && self.stock > 0
    }
}

impl Record for Product {
    const KIND: &'static str = "products";

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn record_version(&self) -> i64 {
        self.version
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }
}
