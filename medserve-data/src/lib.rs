//! Admin data layer: typed resource access over the remote store plus a
//! client-side synchronization cache.
//!
//! The repositories in [`resources`] are the only code that talks to the
//! store; [`cache::SyncHandle`] wraps one repository per entity family and
//! keeps dashboard views (lists, lookups, statistics) consistent across
//! mutations without refetching. [`imaging`] carries the preview-crop
//! helper used by the upload flows.

pub mod cache;
pub mod config;
pub mod error;
pub mod imaging;
pub mod resources;
pub mod retry;

pub use cache::{ChangeEvent, SyncHandle};
pub use config::SyncConfig;
pub use error::{AccessError, AccessResult, CachePatchError};
pub use resources::{
    ChildWriteStatus, Created, GalleryRepository, Resource, ResourceAccess, ServiceRepository,
    ShopRepository, StatusPatch,
};
