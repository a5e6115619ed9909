use axum::http::{HeaderValue, header::HeaderMap};
use serde::Serialize;
use utoipa::ToSchema;

use super::PageWindow;

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    /// Zero-based page index
    pub page: u64,
    /// Effective page size after clamping
    pub page_size: u64,
    /// Items on this page
    pub count: u64,
    /// Rows matching the filters, ignoring the window
    pub total: u64,
    /// Rows in the collection, ignoring filters
    pub collection_total: u64,
}

impl PageMeta {
    #[must_use]
    pub const fn new(window: PageWindow, count: u64, total: u64, collection_total: u64) -> Self {
        Self {
            page: window.page,
            page_size: window.page_size,
            count,
            total,
            collection_total,
        }
    }

    /// Number of pages needed for `total` at this page size.
    #[must_use]
    pub const fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Build the `Content-Range` header for a page, e.g. `tasks 0-24/100`.
///
/// An empty page renders as `tasks */100`.
#[must_use]
pub fn calculate_content_range(meta: &PageMeta, resource_name: &str) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);
    let offset = meta.page.saturating_mul(meta.page_size);

    let content_range = if meta.count == 0 {
        format!("{safe_name} */{}", meta.total)
    } else {
        let last = offset.saturating_add(meta.count - 1);
        format!("{safe_name} {offset}-{last}/{}", meta.total)
    };

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&content_range)
        .unwrap_or_else(|_| HeaderValue::from_static("items */0"));
    headers.insert("Content-Range", value);
    headers
}
