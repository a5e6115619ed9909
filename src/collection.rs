use serde::Serialize;
use serde_json::{Map, Value};

use crate::filtering::PageMeta;

/// One page of a resource collection.
///
/// Serializes flat: `{"items": [...], "page": 0, "page_size": 25, "count": 25,
/// "total": 120, "collection_total": 300, "query": {...}}`. `query` echoes the
/// inbound parameters so callers can build links to neighbouring pages.
#[derive(Debug, Clone, Serialize)]
pub struct Collection<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub meta: PageMeta,
    pub query: Map<String, Value>,
}

impl<T> Collection<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, meta: PageMeta, query: Map<String, Value>) -> Self {
        Self { items, meta, query }
    }

    /// Parameters for the page after this one, or `None` on the last page.
    #[must_use]
    pub fn next_page_query(&self) -> Option<Map<String, Value>> {
        (self.meta.page + 1 < self.meta.page_count()).then(|| self.page_query(self.meta.page + 1))
    }

    /// Parameters for the page before this one, or `None` on the first page.
    #[must_use]
    pub fn previous_page_query(&self) -> Option<Map<String, Value>> {
        (self.meta.page > 0).then(|| self.page_query(self.meta.page - 1))
    }

    fn page_query(&self, page: u64) -> Map<String, Value> {
        let mut query = self.query.clone();
        query.insert("_page".to_string(), Value::from(page));
        query
    }
}
