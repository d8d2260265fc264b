//! Shared types for the MedServe data platform
//!
//! Domain models, draft/input types and query options used by both the
//! store client and the data layer.

pub mod models;
pub mod query;

// Re-exports
pub use models::*;
pub use query::{DEFAULT_PAGE_LIMIT, ListOptions, SortDirection};
pub use serde::{Deserialize, Serialize};
