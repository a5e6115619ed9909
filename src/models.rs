use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Query parameters accepted by a collection GET.
///
/// Handlers read the raw query string rather than this struct, since any
/// non-reserved key is an equality filter. It exists to document the reserved
/// keys in `OpenAPI`.
///
/// # Pagination
/// `_page` is zero-based. `_limit` defaults to 25 and is clamped to 100.
///
/// # Sorting
/// `_orderBy` maps field names to `asc` or `desc`, applied in the order given:
/// ```text
/// ?_orderBy[priority]=desc&_orderBy[title]=asc
/// ```
///
/// # Filtering
/// `query` is a list of filter descriptors, all AND-combined:
/// - **Equality:** `{"type": "eq", "field": "completed", "value": true}`
/// - **Inclusive range:** `{"type": "between", "field": "cycle_number", "from": 10, "to": 100}`
/// - **Every Nth row:** `{"type": "decimation", "field": "cycle_number", "value": 10}`
///
/// Any other key is an equality filter on that field, e.g. `?completed=true`.
///
/// # `OpenAPI`
/// Attach it to the collection GET of a resource:
/// ```rust,ignore
/// #[utoipa::path(get, path = "/api/v1/tasks", params(ListQueryParams))]
/// async fn list_tasks() {}
/// ```
#[derive(Debug, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct ListQueryParams {
    /// Zero-based page index.
    #[serde(rename = "_page")]
    #[param(example = 0)]
    pub page: Option<u64>,
    /// Page size, at most 100.
    #[serde(rename = "_limit")]
    #[param(example = 25)]
    pub limit: Option<u64>,
    /// Ordering as a mapping of field to direction, bracket or JSON encoded.
    #[serde(rename = "_orderBy")]
    #[param(example = json!({"priority": "desc", "title": "asc"}))]
    pub order_by: Option<String>,
    /// Filter descriptors, bracket or JSON encoded.
    #[param(example = json!([
        {"type": "between", "field": "cycle_number", "from": 10, "to": 100},
        {"type": "decimation", "field": "cycle_number", "value": 10}
    ]))]
    pub query: Option<String>,
}
