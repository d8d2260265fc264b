//! List query options
//!
//! One serialized `ListOptions` value identifies one cache entry in the
//! sync layer, so the struct doubles as the cache key for list queries.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Sort direction for list queries, by creation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Newest,
    Oldest,
}

/// Filter and pagination options for list queries.
///
/// The default value is the "overview" query: first page, default page
/// size, no filters, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ListOptions {
    /// 1-based page number
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Family-specific category filter (equipment type for services)
    pub category: Option<String>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: SortDirection,
}

impl ListOptions {
    /// The overview query: first page, default filters.
    pub fn overview() -> Self {
        Self::default()
    }

    pub fn is_overview(&self) -> bool {
        *self == Self::default()
    }

    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn featured_only(mut self) -> Self {
        self.featured = Some(true);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.sort = SortDirection::Oldest;
        self
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        (self.page.unwrap_or(1).max(1) - 1) * self.effective_limit()
    }

    /// Stable cache key for this combination of options.
    pub fn cache_key(&self) -> String {
        // Struct field order is fixed, so the JSON form is deterministic
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_detection() {
        assert!(ListOptions::overview().is_overview());
        assert!(!ListOptions::overview().paginate(2, 10).is_overview());
        assert!(!ListOptions::overview().with_category("imaging").is_overview());
    }

    #[test]
    fn offset_from_page_and_limit() {
        let opts = ListOptions::overview().paginate(3, 25);
        assert_eq!(opts.offset(), 50);
        assert_eq!(opts.effective_limit(), 25);
    }

    #[test]
    fn default_paging() {
        let opts = ListOptions::overview();
        assert_eq!(opts.offset(), 0);
        assert_eq!(opts.effective_limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn cache_key_distinguishes_options() {
        let a = ListOptions::overview().with_category("imaging");
        let b = ListOptions::overview().with_category("surgical");
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), a.clone().cache_key());
    }
}
