//! Data models
//!
//! Shared between the store-facing access functions and the sync layer.
//! All IDs are `Uuid` (assigned by the remote store), money fields are
//! `rust_decimal::Decimal`.

pub mod gallery;
pub mod service;
pub mod shop;
pub mod statistics;

// Re-exports
pub use gallery::*;
pub use service::*;
pub use shop::*;
pub use statistics::*;
