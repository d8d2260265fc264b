//! Data layer configuration

use shared::DEFAULT_PAGE_LIMIT;
use std::time::Duration;

/// Rows the statistics scan will fetch at most. Statistics reduce a full
/// projection client-side, which only works while collections stay small
/// (tens to low thousands of rows); the bound makes that assumption
/// explicit instead of implicit.
pub const DEFAULT_STATS_SCAN_LIMIT: u32 = 5000;

/// Tuning for the sync/cache layer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long a fetched result stays valid before a re-observation
    /// triggers a refetch
    pub staleness: Duration,

    /// Additional attempts for failed read queries
    pub read_retries: u32,

    /// Entries kept in the overview list cache; optimistic inserts trim
    /// back to this size
    pub overview_page_size: u32,

    /// Row bound for the statistics projection scan
    pub stats_scan_limit: u32,

    /// Buffered change events per family
    pub event_capacity: usize,
}

impl SyncConfig {
    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }

    pub fn with_overview_page_size(mut self, size: u32) -> Self {
        self.overview_page_size = size;
        self
    }

    pub fn with_stats_scan_limit(mut self, limit: u32) -> Self {
        self.stats_scan_limit = limit;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staleness: Duration::from_secs(30),
            read_retries: 1,
            overview_page_size: DEFAULT_PAGE_LIMIT,
            stats_scan_limit: DEFAULT_STATS_SCAN_LIMIT,
            event_capacity: 64,
        }
    }
}
