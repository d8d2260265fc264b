//! Shop Product Repository

use super::{inserted_id, rows_to, ChildWriteStatus, Created, Resource, ResourceAccess, StatusPatch};
use crate::error::{AccessError, AccessResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medserve_store::{RemoteStore, SelectQuery};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    ListOptions, ProductCategory, ProductCondition, ProductImageRole, ShopProduct,
    ShopProductDraft, ShopProductImage, ShopStats, SortDirection,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const PRODUCTS_TABLE: &str = "shop_products";
const IMAGES_TABLE: &str = "shop_product_images";

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    original_price: Option<Decimal>,
    category: ProductCategory,
    brand: Option<String>,
    model: Option<String>,
    condition: ProductCondition,
    in_stock: bool,
    stock_quantity: u32,
    #[serde(default)]
    specifications: BTreeMap<String, String>,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    warranty: Option<String>,
    featured: bool,
    #[serde(default)]
    shop_product_images: Vec<ImageRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ImageRow {
    id: Uuid,
    url: String,
    role: ProductImageRole,
    alt_text: Option<String>,
    sort_order: i32,
}

impl From<ProductRow> for ShopProduct {
    fn from(row: ProductRow) -> Self {
        ShopProduct {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            original_price: row.original_price,
            category: row.category,
            brand: row.brand,
            model: row.model,
            condition: row.condition,
            in_stock: row.in_stock,
            stock_quantity: row.stock_quantity,
            specifications: row.specifications,
            features: row.features,
            tags: row.tags,
            warranty: row.warranty,
            featured: row.featured,
            images: row
                .shop_product_images
                .into_iter()
                .map(|i| ShopProductImage {
                    id: i.id,
                    url: i.url,
                    role: i.role,
                    alt_text: i.alt_text,
                    sort_order: i.sort_order,
                })
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProductParent {
    name: String,
    description: String,
    price: Decimal,
    original_price: Option<Decimal>,
    category: ProductCategory,
    brand: Option<String>,
    model: Option<String>,
    condition: ProductCondition,
    in_stock: bool,
    stock_quantity: u32,
    specifications: BTreeMap<String, String>,
    features: Vec<String>,
    tags: Vec<String>,
    warranty: Option<String>,
    featured: bool,
}

impl ProductParent {
    fn from_draft(draft: &ShopProductDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            original_price: draft.original_price,
            category: draft.category,
            brand: draft.brand.clone(),
            model: draft.model.clone(),
            condition: draft.condition,
            in_stock: draft.in_stock,
            stock_quantity: draft.stock_quantity,
            specifications: draft.specifications.clone(),
            features: draft.features.clone(),
            tags: draft.tags.clone(),
            warranty: draft.warranty.clone(),
            featured: draft.featured,
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageInsert {
    product_id: Uuid,
    url: String,
    role: ProductImageRole,
    alt_text: Option<String>,
    sort_order: i32,
}

fn image_rows(product_id: Uuid, draft: &ShopProductDraft) -> AccessResult<Vec<Value>> {
    draft
        .images
        .iter()
        .map(|image| {
            serde_json::to_value(ImageInsert {
                product_id,
                url: image.url.clone(),
                role: image.role,
                alt_text: image.alt_text.clone(),
                sort_order: image.sort_order,
            })
            .map_err(AccessError::from)
        })
        .collect()
}

#[derive(Clone)]
pub struct ShopRepository {
    store: Arc<dyn RemoteStore>,
    stats_scan_limit: u32,
}

impl ShopRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            stats_scan_limit: crate::config::DEFAULT_STATS_SCAN_LIMIT,
        }
    }

    pub fn with_stats_scan_limit(mut self, limit: u32) -> Self {
        self.stats_scan_limit = limit;
        self
    }

    fn list_query(options: &ListOptions) -> SelectQuery {
        let mut query = SelectQuery::new().embed_ordered(IMAGES_TABLE, "sort_order");
        if let Some(category) = &options.category {
            query = query.filter_eq("category", category.as_str());
        }
        if let Some(featured) = options.featured {
            query = query.filter_eq("featured", featured);
        }
        query = match options.sort {
            SortDirection::Newest => query.order_desc("created_at"),
            SortDirection::Oldest => query.order_asc("created_at"),
        };
        query.range(options.offset(), options.effective_limit())
    }

    pub async fn list(&self, options: &ListOptions) -> AccessResult<Vec<ShopProduct>> {
        let rows = self
            .store
            .select(PRODUCTS_TABLE, Self::list_query(options))
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.list", error = %e, "store query failed");
                AccessError::from(e)
            })?;
        Ok(rows_to::<ProductRow>(rows)?
            .into_iter()
            .map(ShopProduct::from)
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> AccessResult<ShopProduct> {
        let row = self
            .store
            .select_one(
                PRODUCTS_TABLE,
                SelectQuery::new()
                    .filter_eq("id", id.to_string())
                    .embed_ordered(IMAGES_TABLE, "sort_order"),
            )
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.get", %id, error = %e, "store query failed");
                AccessError::from(e)
            })?
            .ok_or_else(|| AccessError::NotFound(format!("shop product {id}")))?;
        let row: ProductRow = serde_json::from_value(row)?;
        Ok(row.into())
    }

    pub async fn create(&self, draft: ShopProductDraft) -> AccessResult<Created<ShopProduct>> {
        draft.validate()?;

        let parent = serde_json::to_value(ProductParent::from_draft(&draft))?;
        let inserted = self
            .store
            .insert(PRODUCTS_TABLE, parent)
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.create", error = %e, "parent insert failed");
                AccessError::from(e)
            })?;
        let id = inserted_id(PRODUCTS_TABLE, &inserted)?;

        let mut child_write = ChildWriteStatus::Complete;
        if !draft.images.is_empty() {
            if let Err(e) = self.store.insert_many(IMAGES_TABLE, image_rows(id, &draft)?).await {
                tracing::error!(
                    operation = "shop.create",
                    product_id = %id,
                    error = %e,
                    "image rows were not written"
                );
                child_write = ChildWriteStatus::Failed(e.to_string());
            }
        }

        let entity = self.get(id).await?;
        Ok(Created { entity, child_write })
    }

    pub async fn update(&self, id: Uuid, draft: ShopProductDraft) -> AccessResult<ShopProduct> {
        draft.validate()?;

        let patch = serde_json::to_value(ProductParent::from_draft(&draft))?;
        self.store
            .update_by_id(PRODUCTS_TABLE, id, patch)
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.update", %id, error = %e, "parent update failed");
                AccessError::from(e)
            })?;

        self.store
            .delete_matching(IMAGES_TABLE, "product_id", Value::String(id.to_string()))
            .await
            .map_err(AccessError::from)?;
        if !draft.images.is_empty() {
            self.store
                .insert_many(IMAGES_TABLE, image_rows(id, &draft)?)
                .await
                .map_err(|e| {
                    tracing::error!(operation = "shop.update", %id, error = %e, "image reinsert failed");
                    AccessError::ChildWrite(e.to_string())
                })?;
        }

        self.get(id).await
    }

    pub async fn set_featured(&self, id: Uuid, featured: bool) -> AccessResult<ShopProduct> {
        let patch = serde_json::json!({ "featured": featured });
        self.store
            .update_by_id(PRODUCTS_TABLE, id, patch)
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.set_featured", %id, error = %e, "update failed");
                AccessError::from(e)
            })?;
        self.get(id).await
    }

    pub async fn set_stock(
        &self,
        id: Uuid,
        in_stock: bool,
        quantity: Option<u32>,
    ) -> AccessResult<ShopProduct> {
        let mut patch = serde_json::json!({ "in_stock": in_stock });
        if let (Some(map), Some(quantity)) = (patch.as_object_mut(), quantity) {
            map.insert("stock_quantity".to_string(), quantity.into());
        }
        self.store
            .update_by_id(PRODUCTS_TABLE, id, patch)
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.set_stock", %id, error = %e, "update failed");
                AccessError::from(e)
            })?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AccessResult<()> {
        self.store
            .delete_by_id(PRODUCTS_TABLE, id)
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.delete", %id, error = %e, "delete failed");
                AccessError::from(e)
            })
    }

    pub async fn statistics(&self) -> AccessResult<ShopStats> {
        #[derive(Debug, Deserialize)]
        struct StatRow {
            category: ProductCategory,
            price: Decimal,
            stock_quantity: u32,
            in_stock: bool,
            featured: bool,
        }

        let rows = self
            .store
            .select(
                PRODUCTS_TABLE,
                SelectQuery::new()
                    .columns("category,price,stock_quantity,in_stock,featured")
                    .limit(self.stats_scan_limit),
            )
            .await
            .map_err(|e| {
                tracing::error!(operation = "shop.statistics", error = %e, "store query failed");
                AccessError::from(e)
            })?;

        let mut stats = ShopStats::default();
        for row in rows_to::<StatRow>(rows)? {
            stats.record_product(
                row.category,
                row.price,
                row.stock_quantity,
                row.in_stock,
                row.featured,
            );
        }
        Ok(stats)
    }
}

impl Resource for ShopProduct {
    type Stats = ShopStats;
    type Draft = ShopProductDraft;

    const FAMILY: &'static str = "shop";

    fn id(&self) -> Uuid {
        self.id
    }

    fn fold_stats(stats: &mut ShopStats, entity: &Self) {
        stats.record_product(
            entity.category,
            entity.price,
            entity.stock_quantity,
            entity.in_stock,
            entity.featured,
        );
    }

    fn unfold_stats(stats: &mut ShopStats, entity: &Self) {
        stats.remove_product(
            entity.category,
            entity.price,
            entity.stock_quantity,
            entity.in_stock,
            entity.featured,
        );
    }
}

#[async_trait]
impl ResourceAccess<ShopProduct> for ShopRepository {
    async fn list(&self, options: &ListOptions) -> AccessResult<Vec<ShopProduct>> {
        self.list(options).await
    }

    async fn get(&self, id: Uuid) -> AccessResult<ShopProduct> {
        self.get(id).await
    }

    async fn create(&self, draft: ShopProductDraft) -> AccessResult<Created<ShopProduct>> {
        self.create(draft).await
    }

    async fn update(&self, id: Uuid, draft: ShopProductDraft) -> AccessResult<ShopProduct> {
        self.update(id, draft).await
    }

    async fn set_flag(&self, id: Uuid, patch: StatusPatch) -> AccessResult<ShopProduct> {
        match patch {
            StatusPatch::Featured(featured) => self.set_featured(id, featured).await,
            StatusPatch::Stock { in_stock, quantity } => {
                self.set_stock(id, in_stock, quantity).await
            }
            other => Err(AccessError::Validation(format!(
                "shop products do not support {other:?} updates"
            ))),
        }
    }

    async fn delete(&self, id: Uuid) -> AccessResult<()> {
        self.delete(id).await
    }

    async fn statistics(&self) -> AccessResult<ShopStats> {
        self.statistics().await
    }
}
