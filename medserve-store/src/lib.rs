//! MedServe Store - client for the hosted data backend
//!
//! The application delegates all persistence to a hosted relational data
//! service. This crate models that collaborator as the [`RemoteStore`]
//! trait and ships two backends:
//!
//! - [`HttpStore`]: speaks the backend's PostgREST-style REST conventions
//!   (filter/order/range query parameters, embedded child rows, bearer
//!   auth) over `reqwest`.
//! - [`memory::MemoryStore`] (feature `in-memory`): a table-per-`Vec`
//!   stand-in with the same observable contract, including referential
//!   cascade rules, for tests and offline development.

pub mod config;
pub mod error;
pub mod query;

mod http;

#[cfg(any(test, feature = "in-memory"))]
pub mod memory;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use http::HttpStore;
pub use query::{Embed, Filter, FilterOp, SelectQuery};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Contract the hosted data backend offers, per table: row CRUD plus
/// filtered/ranged selects with child rows embedded.
///
/// Deleting a parent row removes its children through the store's own
/// referential cascade; callers never issue explicit child deletes for
/// that case.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert one row, returning the stored representation (id and
    /// timestamps assigned by the backend).
    async fn insert(&self, table: &str, row: Value) -> StoreResult<Value>;

    /// Bulk-insert rows, returning the stored representations.
    async fn insert_many(&self, table: &str, rows: Vec<Value>) -> StoreResult<Vec<Value>>;

    /// Patch the row with the given id, returning the updated row.
    /// Fails with [`StoreError::NotFound`] when no row matches.
    async fn update_by_id(&self, table: &str, id: Uuid, patch: Value) -> StoreResult<Value>;

    /// Delete the row with the given id. Child rows are removed by the
    /// backend's cascade rule.
    async fn delete_by_id(&self, table: &str, id: Uuid) -> StoreResult<()>;

    /// Delete every row whose column equals the given value.
    async fn delete_matching(&self, table: &str, column: &str, value: Value) -> StoreResult<()>;

    /// Run a filtered/ordered/ranged select, optionally embedding child
    /// rows, returning the matching rows.
    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>>;

    /// Convenience: select with a limit of one.
    async fn select_one(&self, table: &str, query: SelectQuery) -> StoreResult<Option<Value>> {
        let mut rows = self.select(table, query.limit(1)).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }
}
