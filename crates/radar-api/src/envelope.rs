//! # Response Envelope
//!
//! Every successful response is wrapped as
//!
//! ```json
//! {"data": ..., "metadata": {"total_count", "page", "per_page", "has_next"}, "status": "success"}
//! ```
//!
//! `metadata` is present only on list endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 1000;

/// Success wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMeta>,
    pub status: &'static str,
}

impl<T> ApiResponse<T> {
    /// Single-object response.
    pub fn ok(data: T) -> Self {
        Self {
            data,
            metadata: None,
            status: "success",
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// One page of `items`.
    pub fn page(items: Vec<T>, pagination: Pagination) -> Self {
        let (data, meta) = pagination.apply(items);
        Self {
            data,
            metadata: Some(meta),
            status: "success",
        }
    }
}

/// List metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    /// Items matching the filters, across all pages.
    pub total_count: usize,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Whether a later page exists.
    pub has_next: bool,
}

/// Validated page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Resolve optional query values, applying defaults and bounds.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Result<Self, String> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page == 0 {
            return Err("page must be at least 1".to_string());
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(format!("per_page must be between 1 and {MAX_PER_PAGE}"));
        }
        Ok(Self { page, per_page })
    }

    /// Slice one page out of `items`.
    pub fn apply<T>(&self, items: Vec<T>) -> (Vec<T>, PageMeta) {
        let total_count = items.len();
        let per_page = self.per_page as usize;
        let start = (self.page as usize - 1).saturating_mul(per_page);
        let data: Vec<T> = items.into_iter().skip(start).take(per_page).collect();
        let has_next = start.saturating_add(per_page) < total_count;
        (
            data,
            PageMeta {
                total_count,
                page: self.page,
                per_page: self.per_page,
                has_next,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_bounds() {
        assert_eq!(Pagination::new(None, None).unwrap(), Pagination::default());
        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert!(Pagination::new(None, Some(1001)).is_err());
        assert!(Pagination::new(Some(3), Some(1000)).is_ok());
    }

    #[test]
    fn pages_slice_and_flag_next() {
        let p = Pagination::new(Some(2), Some(10)).unwrap();
        let (data, meta) = p.apply((0..25).collect::<Vec<_>>());
        assert_eq!(data, (10..20).collect::<Vec<_>>());
        assert_eq!(meta.total_count, 25);
        assert!(meta.has_next);

        let p = Pagination::new(Some(3), Some(10)).unwrap();
        let (data, meta) = p.apply((0..25).collect::<Vec<_>>());
        assert_eq!(data.len(), 5);
        assert!(!meta.has_next);
    }

    #[test]
    fn page_past_end_is_empty() {
        let p = Pagination::new(Some(9), Some(10)).unwrap();
        let (data, meta) = p.apply(vec![1, 2, 3]);
        assert!(data.is_empty());
        assert!(!meta.has_next);
    }

    #[test]
    fn envelope_shape() {
        let single = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert_eq!(single["status"], "success");
        assert!(single.get("metadata").is_none());

        let list =
            serde_json::to_value(ApiResponse::page(vec![1, 2], Pagination::default())).unwrap();
        assert_eq!(list["metadata"]["total_count"], 2);
        assert_eq!(list["metadata"]["has_next"], false);
    }
}
