//! Service Repository

use super::{inserted_id, rows_to, ChildWriteStatus, Created, Resource, ResourceAccess, StatusPatch};
use crate::error::{AccessError, AccessResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use medserve_store::{RemoteStore, SelectQuery};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    ListOptions, PartUsed, PaymentStatus, Service, ServiceDraft, ServiceStats, ServiceStatus,
    SortDirection,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const SERVICES_TABLE: &str = "services";
const PARTS_TABLE: &str = "service_parts";

// =============================================================================
// Row shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct ServiceRow {
    id: Uuid,
    title: String,
    description: String,
    equipment_type: String,
    client_name: String,
    location: String,
    service_date: NaiveDate,
    completion_date: Option<NaiveDate>,
    duration_hours: f64,
    service_fee: Decimal,
    labor_cost: Decimal,
    total_cost: Decimal,
    status: ServiceStatus,
    payment_status: PaymentStatus,
    technician: String,
    notes: Option<String>,
    #[serde(default)]
    service_parts: Vec<PartRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct PartRow {
    id: Uuid,
    name: String,
    quantity: u32,
    unit_cost: Decimal,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            title: row.title,
            description: row.description,
            equipment_type: row.equipment_type,
            client_name: row.client_name,
            location: row.location,
            service_date: row.service_date,
            completion_date: row.completion_date,
            duration_hours: row.duration_hours,
            service_fee: row.service_fee,
            labor_cost: row.labor_cost,
            total_cost: row.total_cost,
            status: row.status,
            payment_status: row.payment_status,
            technician: row.technician,
            notes: row.notes,
            parts_used: row
                .service_parts
                .into_iter()
                .map(|p| PartUsed {
                    id: p.id,
                    name: p.name,
                    quantity: p.quantity,
                    unit_cost: p.unit_cost,
                })
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Parent-row fields written on create and update. Payment status is
/// deliberately absent: it is defaulted on create and only changed through
/// the narrow status update.
#[derive(Debug, Serialize)]
struct ServiceParent {
    title: String,
    description: String,
    equipment_type: String,
    client_name: String,
    location: String,
    service_date: NaiveDate,
    completion_date: Option<NaiveDate>,
    duration_hours: f64,
    service_fee: Decimal,
    labor_cost: Decimal,
    total_cost: Decimal,
    status: ServiceStatus,
    technician: String,
    notes: Option<String>,
}

impl ServiceParent {
    fn from_draft(draft: &ServiceDraft) -> Self {
        Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            equipment_type: draft.equipment_type.clone(),
            client_name: draft.client_name.clone(),
            location: draft.location.clone(),
            service_date: draft.service_date,
            completion_date: draft.completion_date,
            duration_hours: draft.duration_hours,
            service_fee: draft.service_fee,
            labor_cost: draft.labor_cost,
            // Stored total is labor plus parts; the service fee lives in
            // quote_total only
            total_cost: draft.record_total(),
            status: draft.status,
            technician: draft.technician.clone(),
            notes: draft.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PartInsert {
    service_id: Uuid,
    name: String,
    quantity: u32,
    unit_cost: Decimal,
    position: i32,
}

fn part_rows(service_id: Uuid, draft: &ServiceDraft) -> AccessResult<Vec<Value>> {
    draft
        .parts_used
        .iter()
        .enumerate()
        .map(|(position, part)| {
            serde_json::to_value(PartInsert {
                service_id,
                name: part.name.clone(),
                quantity: part.quantity,
                unit_cost: part.unit_cost,
                position: position as i32,
            })
            .map_err(AccessError::from)
        })
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Clone)]
pub struct ServiceRepository {
    store: Arc<dyn RemoteStore>,
    stats_scan_limit: u32,
}

impl ServiceRepository {
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
        let mut query = SelectQuery::new().embed_ordered(PARTS_TABLE, "position");
        // Services expose their equipment type as the category filter;
        // there is no featured flag on this family
        if let Some(category) = &options.category {
            query = query.filter_eq("equipment_type", category.as_str());
        }
        query = match options.sort {
            SortDirection::Newest => query.order_desc("created_at"),
            SortDirection::Oldest => query.order_asc("created_at"),
        };
        query.range(options.offset(), options.effective_limit())
    }

    pub async fn list(&self, options: &ListOptions) -> AccessResult<Vec<Service>> {
        let rows = self
            .store
            .select(SERVICES_TABLE, Self::list_query(options))
            .await
            .map_err(|e| {
                tracing::error!(operation = "services.list", error = %e, "store query failed");
                AccessError::from(e)
            })?;
        Ok(rows_to::<ServiceRow>(rows)?
            .into_iter()
            .map(Service::from)
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> AccessResult<Service> {
        let row = self
            .store
            .select_one(
                SERVICES_TABLE,
                SelectQuery::new()
                    .filter_eq("id", id.to_string())
                    .embed_ordered(PARTS_TABLE, "position"),
            )
            .await
            .map_err(|e| {
                tracing::error!(operation = "services.get", %id, error = %e, "store query failed");
                AccessError::from(e)
            })?
            .ok_or_else(|| AccessError::NotFound(format!("service {id}")))?;
        let row: ServiceRow = serde_json::from_value(row)?;
        Ok(row.into())
    }

    pub async fn create(&self, draft: ServiceDraft) -> AccessResult<Created<Service>> {
        draft.validate()?;

        let mut parent = serde_json::to_value(ServiceParent::from_draft(&draft))?;
        if let Value::Object(map) = &mut parent {
            map.insert(
                "payment_status".to_string(),
                serde_json::to_value(PaymentStatus::Pending)?,
            );
        }

        let inserted = self
            .store
            .insert(SERVICES_TABLE, parent)
            .await
            .map_err(|e| {
                tracing::error!(operation = "services.create", error = %e, "parent insert failed");
                AccessError::from(e)
            })?;
        let id = inserted_id(SERVICES_TABLE, &inserted)?;

        let mut child_write = ChildWriteStatus::Complete;
        if !draft.parts_used.is_empty() {
            if let Err(e) = self.store.insert_many(PARTS_TABLE, part_rows(id, &draft)?).await {
                // The parent row is not rolled back; the caller sees the
                // degradation through the returned status
                tracing::error!(
                    operation = "services.create",
                    service_id = %id,
                    error = %e,
                    "part rows were not written"
                );
                child_write = ChildWriteStatus::Failed(e.to_string());
            }
        }

        let entity = self.get(id).await?;
        Ok(Created { entity, child_write })
    }

    pub async fn update(&self, id: Uuid, draft: ServiceDraft) -> AccessResult<Service> {
        draft.validate()?;

        let patch = serde_json::to_value(ServiceParent::from_draft(&draft))?;
        self.store
            .update_by_id(SERVICES_TABLE, id, patch)
            .await
            .map_err(|e| {
                tracing::error!(operation = "services.update", %id, error = %e, "parent update failed");
                AccessError::from(e)
            })?;

        // Replace the full child set: delete everything, re-insert the
        // supplied list. Part ids do not survive an update.
        self.store
            .delete_matching(PARTS_TABLE, "service_id", Value::String(id.to_string()))
            .await
            .map_err(AccessError::from)?;
        if !draft.parts_used.is_empty() {
            self.store
                .insert_many(PARTS_TABLE, part_rows(id, &draft)?)
                .await
                .map_err(|e| {
                    tracing::error!(operation = "services.update", %id, error = %e, "part reinsert failed");
                    AccessError::ChildWrite(e.to_string())
                })?;
        }

        self.get(id).await
    }

    pub async fn set_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> AccessResult<Service> {
        let patch = serde_json::json!({ "payment_status": payment_status });
        self.store
            .update_by_id(SERVICES_TABLE, id, patch)
            .await
            .map_err(|e| {
                tracing::error!(operation = "services.set_payment_status", %id, error = %e, "update failed");
                AccessError::from(e)
            })?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AccessResult<()> {
        // Parts are removed by the store's cascade rule, not by this layer
        self.store
            .delete_by_id(SERVICES_TABLE, id)
            .await
            .map_err(|e| {
                tracing::error!(operation = "services.delete", %id, error = %e, "delete failed");
                AccessError::from(e)
            })
    }

    pub async fn statistics(&self) -> AccessResult<ServiceStats> {
        #[derive(Debug, Deserialize)]
        struct StatRow {
            status: ServiceStatus,
            payment_status: PaymentStatus,
            total_cost: Decimal,
            equipment_type: String,
        }

        let rows = self
            .store
            .select(
                SERVICES_TABLE,
                SelectQuery::new()
                    .columns("status,payment_status,total_cost,equipment_type")
                    .limit(self.stats_scan_limit),
            )
            .await
            .map_err(|e| {
                tracing::error!(operation = "services.statistics", error = %e, "store query failed");
                AccessError::from(e)
            })?;

        let mut stats = ServiceStats::default();
        for row in rows_to::<StatRow>(rows)? {
            stats.record_service(row.status, row.payment_status, row.total_cost, &row.equipment_type);
        }
        Ok(stats)
    }
}

impl Resource for Service {
    type Stats = ServiceStats;
    type Draft = ServiceDraft;

    const FAMILY: &'static str = "services";

    fn id(&self) -> Uuid {
        self.id
    }

    fn fold_stats(stats: &mut ServiceStats, entity: &Self) {
        stats.record_service(
            entity.status,
            entity.payment_status,
            entity.total_cost,
            &entity.equipment_type,
        );
    }

    fn unfold_stats(stats: &mut ServiceStats, entity: &Self) {
        stats.remove_service(
            entity.status,
            entity.payment_status,
            entity.total_cost,
            &entity.equipment_type,
        );
    }
}

#[async_trait]
impl ResourceAccess<Service> for ServiceRepository {
    async fn list(&self, options: &ListOptions) -> AccessResult<Vec<Service>> {
        self.list(options).await
    }

    async fn get(&self, id: Uuid) -> AccessResult<Service> {
        self.get(id).await
    }

    async fn create(&self, draft: ServiceDraft) -> AccessResult<Created<Service>> {
        self.create(draft).await
    }

    async fn update(&self, id: Uuid, draft: ServiceDraft) -> AccessResult<Service> {
        self.update(id, draft).await
    }

    async fn set_flag(&self, id: Uuid, patch: StatusPatch) -> AccessResult<Service> {
        match patch {
            StatusPatch::Payment(status) => self.set_payment_status(id, status).await,
            other => Err(AccessError::Validation(format!(
                "services do not support {other:?} updates"
            ))),
        }
    }

    async fn delete(&self, id: Uuid) -> AccessResult<()> {
        self.delete(id).await
    }

    async fn statistics(&self) -> AccessResult<ServiceStats> {
        self.statistics().await
    }
}
