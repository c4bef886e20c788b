// ABOUTME: Pagination for list endpoints
// ABOUTME: Fixed page size with standardized metadata in responses

use serde::{Deserialize, Serialize};

/// Every list endpoint pages by this size.
pub const PAGE_SIZE: i64 = 5;

/// Minimum page number (1-indexed)
pub const MIN_PAGE: i64 = 1;

/// Query parameters for pagination
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-indexed, defaults to 1)
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    MIN_PAGE
}

impl PaginationParams {
    pub fn new(page: i64) -> Self {
        Self { page }
    }

    /// Current page, clamped to at least 1.
    pub fn page(&self) -> i64 {
        self.page.max(MIN_PAGE)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * PAGE_SIZE
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: MIN_PAGE }
    }
}

/// Metadata about pagination state
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
    #[serde(rename = "totalItems")]
    pub total_items: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "hasPreviousPage")]
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total_items: i64) -> Self {
        let page = params.page();
        let total_pages = (total_items + PAGE_SIZE - 1) / PAGE_SIZE;

        Self {
            page,
            page_size: PAGE_SIZE,
            total_items,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > MIN_PAGE,
        }
    }
}

/// One page of results with its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total_items: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(params, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), PAGE_SIZE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_page_is_clamped() {
        let params = PaginationParams::new(-3);
        assert_eq!(params.page(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_calculation() {
        let params = PaginationParams::new(2);
        assert_eq!(params.offset(), PAGE_SIZE);

        let params = PaginationParams::new(3);
        assert_eq!(params.offset(), 2 * PAGE_SIZE);
    }

    #[test]
    fn test_meta_six_items_spans_two_pages() {
        let params = PaginationParams::new(1);
        let meta = PaginationMeta::new(&params, 6);

        assert_eq!(meta.total_pages, 2);
        assert!(meta.has_next_page);
        assert!(!meta.has_previous_page);
    }

    #[test]
    fn test_meta_last_page() {
        let params = PaginationParams::new(2);
        let meta = PaginationMeta::new(&params, 6);

        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }
}
