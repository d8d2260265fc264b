//! Resource access functions
//!
//! One repository per entity family; the only code that speaks to the
//! remote store for that family. Each encapsulates the composite writes
//! (parent row plus owned child rows) and reshapes store rows into domain
//! entities.
//!
//! All three families share the same write pattern:
//! - create: insert parent with computed/defaulted fields, bulk-insert
//!   children tagged with the new parent id, re-fetch the complete entity.
//!   A failed child insert yields an explicit partial-success result
//!   ([`Created::child_write`]) rather than being swallowed.
//! - update: patch parent, delete all child rows, re-insert the full
//!   supplied set. Child rows have no identity across updates; callers
//!   rely on that, so no diffing is attempted.
//! - delete: parent row only; the store's cascade removes children.

pub mod gallery;
pub mod services;
pub mod shop;

pub use gallery::GalleryRepository;
pub use services::ServiceRepository;
pub use shop::ShopRepository;

use crate::error::{AccessError, AccessResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{ListOptions, PaymentStatus};
use uuid::Uuid;

/// An entity family managed by the sync layer.
pub trait Resource: Clone + Send + Sync + 'static {
    /// Derived statistics view for the family
    type Stats: Clone + Default + Send + Sync + 'static;
    /// Full create/replace input payload
    type Draft: Clone + Send + Sync + 'static;

    const FAMILY: &'static str;

    fn id(&self) -> Uuid;

    /// Fold this entity into cached statistics (optimistic create patch).
    fn fold_stats(stats: &mut Self::Stats, entity: &Self);

    /// Remove this entity from cached statistics (delete patch); counters
    /// floor at zero.
    fn unfold_stats(stats: &mut Self::Stats, entity: &Self);
}

/// Outcome of a child-row bulk write during `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildWriteStatus {
    Complete,
    /// The parent row exists but its child rows were not written
    Failed(String),
}

impl ChildWriteStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Result of `create`: the stored entity plus whether its child rows made
/// it. The parent write is never rolled back on a child failure; callers
/// must inspect `child_write` instead of assuming a complete entity.
#[derive(Debug, Clone)]
pub struct Created<E> {
    pub entity: E,
    pub child_write: ChildWriteStatus,
}

/// Narrow single-field status update, so a trivial flip does not require
/// the full entity payload. Each family accepts only the variants that
/// exist on it and rejects the rest.
#[derive(Debug, Clone)]
pub enum StatusPatch {
    /// Payment status (services)
    Payment(PaymentStatus),
    /// Featured flag (gallery items, shop products)
    Featured(bool),
    /// Stock availability (shop products); `quantity` is left unchanged
    /// when `None`
    Stock {
        in_stock: bool,
        quantity: Option<u32>,
    },
}

/// Uniform access contract the sync layer consumes; one implementation
/// per family, differing only in entity shape.
#[async_trait]
pub trait ResourceAccess<E: Resource>: Send + Sync {
    async fn list(&self, options: &ListOptions) -> AccessResult<Vec<E>>;
    async fn get(&self, id: Uuid) -> AccessResult<E>;
    async fn create(&self, draft: E::Draft) -> AccessResult<Created<E>>;
    async fn update(&self, id: Uuid, draft: E::Draft) -> AccessResult<E>;
    async fn set_flag(&self, id: Uuid, patch: StatusPatch) -> AccessResult<E>;
    async fn delete(&self, id: Uuid) -> AccessResult<()>;
    async fn statistics(&self) -> AccessResult<E::Stats>;
}

/// Deserialize store rows into typed values.
pub(crate) fn rows_to<T: DeserializeOwned>(rows: Vec<Value>) -> AccessResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(AccessError::from))
        .collect()
}

/// Extract the id the store assigned to an inserted row.
pub(crate) fn inserted_id(table: &str, row: &Value) -> AccessResult<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            AccessError::Store(medserve_store::StoreError::InvalidResponse(format!(
                "{table} insert returned no id"
            )))
        })
}
