//! Gallery Repository

use super::{inserted_id, rows_to, ChildWriteStatus, Created, Resource, ResourceAccess, StatusPatch};
use crate::error::{AccessError, AccessResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use medserve_store::{RemoteStore, SelectQuery};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    GalleryCategory, GalleryDraft, GalleryImage, GalleryImageRole, GalleryItem, GalleryStats,
    ListOptions, SortDirection,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const ITEMS_TABLE: &str = "gallery_items";
const IMAGES_TABLE: &str = "gallery_images";

#[derive(Debug, Deserialize)]
struct ItemRow {
    id: Uuid,
    title: String,
    description: String,
    category: GalleryCategory,
    alt_text: Option<String>,
    location: Option<String>,
    service_date: Option<NaiveDate>,
    equipment_type: Option<String>,
    testimonial: Option<String>,
    rating: u8,
    featured: bool,
    #[serde(default)]
    gallery_images: Vec<ImageRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ImageRow {
    id: Uuid,
    url: String,
    role: GalleryImageRole,
    caption: Option<String>,
    sort_order: i32,
}

impl From<ItemRow> for GalleryItem {
    fn from(row: ItemRow) -> Self {
        GalleryItem {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            alt_text: row.alt_text,
            location: row.location,
            service_date: row.service_date,
            equipment_type: row.equipment_type,
            testimonial: row.testimonial,
            rating: row.rating,
            featured: row.featured,
            images: row
                .gallery_images
                .into_iter()
                .map(|i| GalleryImage {
                    id: i.id,
                    url: i.url,
                    role: i.role,
                    caption: i.caption,
                    sort_order: i.sort_order,
                })
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct ItemParent {
    title: String,
    description: String,
    category: GalleryCategory,
    alt_text: Option<String>,
    location: Option<String>,
    service_date: Option<NaiveDate>,
    equipment_type: Option<String>,
    testimonial: Option<String>,
    rating: u8,
    featured: bool,
}

impl ItemParent {
    fn from_draft(draft: &GalleryDraft) -> Self {
        Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category,
            alt_text: draft.alt_text.clone(),
            location: draft.location.clone(),
            service_date: draft.service_date,
            equipment_type: draft.equipment_type.clone(),
            testimonial: draft.testimonial.clone(),
            rating: draft.rating,
            featured: draft.featured,
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageInsert {
    gallery_item_id: Uuid,
    url: String,
    role: GalleryImageRole,
    caption: Option<String>,
    sort_order: i32,
}

fn image_rows(item_id: Uuid, draft: &GalleryDraft) -> AccessResult<Vec<Value>> {
    draft
        .images
        .iter()
        .map(|image| {
            serde_json::to_value(ImageInsert {
                gallery_item_id: item_id,
                url: image.url.clone(),
                role: image.role,
                caption: image.caption.clone(),
                sort_order: image.sort_order,
            })
            .map_err(AccessError::from)
        })
        .collect()
}

#[derive(Clone)]
pub struct GalleryRepository {
    store: Arc<dyn RemoteStore>,
    stats_scan_limit: u32,
}

impl GalleryRepository {
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

    pub async fn list(&self, options: &ListOptions) -> AccessResult<Vec<GalleryItem>> {
        let rows = self
            .store
            .select(ITEMS_TABLE, Self::list_query(options))
            .await
            .map_err(|e| {
                tracing::error!(operation = "gallery.list", error = %e, "store query failed");
                AccessError::from(e)
            })?;
        Ok(rows_to::<ItemRow>(rows)?
            .into_iter()
            .map(GalleryItem::from)
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> AccessResult<GalleryItem> {
        let row = self
            .store
            .select_one(
                ITEMS_TABLE,
                SelectQuery::new()
                    .filter_eq("id", id.to_string())
                    .embed_ordered(IMAGES_TABLE, "sort_order"),
            )
            .await
            .map_err(|e| {
                tracing::error!(operation = "gallery.get", %id, error = %e, "store query failed");
                AccessError::from(e)
            })?
            .ok_or_else(|| AccessError::NotFound(format!("gallery item {id}")))?;
        let row: ItemRow = serde_json::from_value(row)?;
        Ok(row.into())
    }

    pub async fn create(&self, draft: GalleryDraft) -> AccessResult<Created<GalleryItem>> {
        draft.validate()?;

        let parent = serde_json::to_value(ItemParent::from_draft(&draft))?;
        let inserted = self.store.insert(ITEMS_TABLE, parent).await.map_err(|e| {
            tracing::error!(operation = "gallery.create", error = %e, "parent insert failed");
            AccessError::from(e)
        })?;
        let id = inserted_id(ITEMS_TABLE, &inserted)?;

        let mut child_write = ChildWriteStatus::Complete;
        if !draft.images.is_empty() {
            if let Err(e) = self.store.insert_many(IMAGES_TABLE, image_rows(id, &draft)?).await {
                tracing::error!(
                    operation = "gallery.create",
                    item_id = %id,
                    error = %e,
                    "image rows were not written"
                );
                child_write = ChildWriteStatus::Failed(e.to_string());
            }
        }

        let entity = self.get(id).await?;
        Ok(Created { entity, child_write })
    }

    pub async fn update(&self, id: Uuid, draft: GalleryDraft) -> AccessResult<GalleryItem> {
        draft.validate()?;

        let patch = serde_json::to_value(ItemParent::from_draft(&draft))?;
        self.store
            .update_by_id(ITEMS_TABLE, id, patch)
            .await
            .map_err(|e| {
                tracing::error!(operation = "gallery.update", %id, error = %e, "parent update failed");
                AccessError::from(e)
            })?;

        self.store
            .delete_matching(IMAGES_TABLE, "gallery_item_id", Value::String(id.to_string()))
            .await
            .map_err(AccessError::from)?;
        if !draft.images.is_empty() {
            self.store
                .insert_many(IMAGES_TABLE, image_rows(id, &draft)?)
                .await
                .map_err(|e| {
                    tracing::error!(operation = "gallery.update", %id, error = %e, "image reinsert failed");
                    AccessError::ChildWrite(e.to_string())
                })?;
        }

        self.get(id).await
    }

    pub async fn set_featured(&self, id: Uuid, featured: bool) -> AccessResult<GalleryItem> {
        let patch = serde_json::json!({ "featured": featured });
        self.store
            .update_by_id(ITEMS_TABLE, id, patch)
            .await
            .map_err(|e| {
                tracing::error!(operation = "gallery.set_featured", %id, error = %e, "update failed");
                AccessError::from(e)
            })?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AccessResult<()> {
        self.store.delete_by_id(ITEMS_TABLE, id).await.map_err(|e| {
            tracing::error!(operation = "gallery.delete", %id, error = %e, "delete failed");
            AccessError::from(e)
        })
    }

    pub async fn statistics(&self) -> AccessResult<GalleryStats> {
        #[derive(Debug, Deserialize)]
        struct StatRow {
            category: GalleryCategory,
            rating: u8,
            featured: bool,
        }

        let rows = self
            .store
            .select(
                ITEMS_TABLE,
                SelectQuery::new()
                    .columns("category,rating,featured")
                    .limit(self.stats_scan_limit),
            )
            .await
            .map_err(|e| {
                tracing::error!(operation = "gallery.statistics", error = %e, "store query failed");
                AccessError::from(e)
            })?;

        let mut stats = GalleryStats::default();
        for row in rows_to::<StatRow>(rows)? {
            stats.record_item(row.category, row.rating, row.featured);
        }
        Ok(stats)
    }
}

impl Resource for GalleryItem {
    type Stats = GalleryStats;
    type Draft = GalleryDraft;

    const FAMILY: &'static str = "gallery";

    fn id(&self) -> Uuid {
        self.id
    }

    fn fold_stats(stats: &mut GalleryStats, entity: &Self) {
        stats.record_item(entity.category, entity.rating, entity.featured);
    }

    fn unfold_stats(stats: &mut GalleryStats, entity: &Self) {
        stats.remove_item(entity.category, entity.rating, entity.featured);
    }
}

#[async_trait]
impl ResourceAccess<GalleryItem> for GalleryRepository {
    async fn list(&self, options: &ListOptions) -> AccessResult<Vec<GalleryItem>> {
        self.list(options).await
    }

    async fn get(&self, id: Uuid) -> AccessResult<GalleryItem> {
        self.get(id).await
    }

    async fn create(&self, draft: GalleryDraft) -> AccessResult<Created<GalleryItem>> {
        self.create(draft).await
    }

    async fn update(&self, id: Uuid, draft: GalleryDraft) -> AccessResult<GalleryItem> {
        self.update(id, draft).await
    }

    async fn set_flag(&self, id: Uuid, patch: StatusPatch) -> AccessResult<GalleryItem> {
        match patch {
            StatusPatch::Featured(featured) => self.set_featured(id, featured).await,
            other => Err(AccessError::Validation(format!(
                "gallery items do not support {other:?} updates"
            ))),
        }
    }

    async fn delete(&self, id: Uuid) -> AccessResult<()> {
        self.delete(id).await
    }

    async fn statistics(&self) -> AccessResult<GalleryStats> {
        self.statistics().await
    }
}
