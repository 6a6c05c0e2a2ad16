use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::errors::ServiceError;
use crate::export::products_csv::{self, SkippedRow};
use crate::store::{Condition, RecordStore};

use super::product::{Product, ProductRow};

// ============================================================================
// Product Catalog
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRow>,
}

pub struct ProductCatalog {
    products: Arc<dyn RecordStore<Product>>,
}

impl ProductCatalog {
    pub fn new(products: Arc<dyn RecordStore<Product>>) -> Self {
        Self { products }
    }

    fn authorize(actor: &Actor, seller_id: Uuid) -> Result<(), ServiceError> {
        if actor.is_admin() || actor.is(Role::Seller, seller_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("sellers only manage their own products".to_string()))
        }
    }

    pub async fn add_product(&self, actor: Actor, seller_id: Uuid, row: ProductRow) -> Result<Product, ServiceError> {
        Self::authorize(&actor, seller_id)?;
        if row.name.trim().is_empty() {
            return Err(ServiceError::Validation("product name is required".to_string()));
        }

        let product = Product::new(seller_id, row, Utc::now());
        self.products.insert(&product).await?;
        tracing::info!(product_id = %product.id, seller_id = %seller_id, name = %product.name, "Product added");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<Product, ServiceError> {
        self.products
            .get(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))
    }

    /// A seller's products, by name
    pub async fn seller_products(&self, seller_id: Uuid) -> Result<Vec<Product>, ServiceError> {
        let mut products: Vec<Product> = self
            .products
            .list()
            .await?
            .into_iter()
            .filter(|p| p.seller_id == seller_id)
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    pub async fn export_products_csv(&self, actor: Actor, seller_id: Uuid) -> Result<String, ServiceError> {
        Self::authorize(&actor, seller_id)?;
        let products = self.seller_products(seller_id).await?;
        tracing::debug!(seller_id = %seller_id, count = products.len(), "Exporting products");
        Ok(products_csv::render(&products))
    }

    /// Rows whose SKU matches a product of the seller update it; everything
    /// else is created. A SKU repeated within the file updates the product
    /// its earlier row wrote, so the last row wins.
    pub async fn import_products_csv(
        &self,
        actor: Actor,
        seller_id: Uuid,
        text: &str,
    ) -> Result<ImportSummary, ServiceError> {
        Self::authorize(&actor, seller_id)?;

        let parsed = products_csv::parse(text);
        let mut by_sku: HashMap<String, Product> = HashMap::new();
        for product in self.seller_products(seller_id).await? {
            if let Some(sku) = product.sku.clone() {
                by_sku.entry(sku).or_insert(product);
            }
        }
        let mut summary = ImportSummary { created: 0, updated: 0, skipped: parsed.skipped };

        for row in parsed.rows {
            let sku = row.sku.clone();
            let product = match sku.as_deref().and_then(|sku| by_sku.remove(sku)) {
                Some(mut current) => {
                    let base = current.version;
                    current.revise(row, Utc::now());
                    if !self.products.update(&current, Condition::VersionIs(base)).await? {
                        return Err(ServiceError::Conflict { kind: "product", id: current.id });
                    }
                    summary.updated += 1;
                    current
                }
                None => {
                    let created = Product::new(seller_id, row, Utc::now());
                    self.products.insert(&created).await?;
                    summary.created += 1;
                    created
                }
            };
            if let Some(sku) = sku {
                by_sku.insert(sku, product);
            }
        }

        tracing::info!(
            seller_id = %seller_id,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped.len(),
            "📦 Products imported"
        );
        Ok(summary)
    }
}
