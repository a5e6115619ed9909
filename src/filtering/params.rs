//! Normalization of an untyped parameter map into a [`QueryRequest`].
//!
//! Reserved keys carry structure:
//!
//! | key        | meaning                                   | default       |
//! |------------|-------------------------------------------|---------------|
//! | `_page`    | zero-based page index                     | `0`           |
//! | `_limit`   | page size, silently clamped to the max    | `25`          |
//! | `_orderBy` | `{field: "asc" \| "desc", ...}` in order  | `{id: asc}`   |
//! | `query`    | list of `{type, field, ...}` filter specs | none          |
//!
//! Every other key is an equality filter on the field of the same name.

use sea_orm::Order;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::InvalidParameter;

pub const PAGE_KEY: &str = "_page";
pub const LIMIT_KEY: &str = "_limit";
pub const ORDER_BY_KEY: &str = "_orderBy";
pub const QUERY_KEY: &str = "query";

/// Keys that never become implicit equality filters.
pub const RESERVED_KEYS: [&str; 4] = [PAGE_KEY, LIMIT_KEY, ORDER_BY_KEY, QUERY_KEY];

/// Pagination and ordering defaults for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListDefaults {
    /// Page size used when `_limit` is absent
    pub default_page_size: u64,
    /// Upper bound `_limit` is clamped to
    pub max_page_size: u64,
    /// Ordering used when `_orderBy` is absent or empty
    pub default_order: Vec<OrderSpec>,
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 100,
            default_order: vec![OrderSpec::new("id", Direction::Asc)],
        }
    }
}

/// One predicate of a list query. All clauses are AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// `field = value`, or `field IS NULL` when the value is null
    Equality { field: String, value: Value },
    /// `from <= field <= to`
    Between { field: String, from: Value, to: Value },
    /// `field mod modulus = 0`, keeps every Nth row
    Decimation { field: String, modulus: i64 },
}

impl FilterClause {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Equality { field, .. }
            | Self::Between { field, .. }
            | Self::Decimation { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Parse `asc`/`desc` in any letter case.
    fn parse(field: &str, token: &str) -> Result<Self, InvalidParameter> {
        match token.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(InvalidParameter::UnknownDirection {
                field: field.to_string(),
                token: token.to_string(),
            }),
        }
    }
}

impl From<Direction> for Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderSpec {
    pub field: String,
    pub direction: Direction,
}

impl OrderSpec {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Zero-based page index and a page size in `[1, max_page_size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub page_size: u64,
}

impl PageWindow {
    /// Rows to skip before the current page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size)
    }
}

/// Typed form of one list call. Built per request, consumed once by the query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub filters: Vec<FilterClause>,
    pub order: Vec<OrderSpec>,
    pub window: PageWindow,
}

impl QueryRequest {
    /// Normalize a raw parameter map.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameter`] for a negative or non-integral `_page`, a
    /// page whose row offset does not fit in an `i64`, a non-positive or
    /// non-integral `_limit`, an unknown sort direction, or a filter descriptor
    /// with an unknown `type` or missing sub-fields.
    pub fn from_params(
        params: &Map<String, Value>,
        defaults: &ListDefaults,
    ) -> Result<Self, InvalidParameter> {
        let page = match params.get(PAGE_KEY) {
            Some(value) => {
                let page = parse_integer(PAGE_KEY, value)?;
                u64::try_from(page).map_err(|_| InvalidParameter::OutOfRange {
                    key: PAGE_KEY.to_string(),
                    reason: "must not be negative",
                })?
            }
            None => 0,
        };

        let page_size = match params.get(LIMIT_KEY) {
            Some(value) => {
                let limit = parse_integer(LIMIT_KEY, value)?;
                let limit = u64::try_from(limit)
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or_else(|| InvalidParameter::OutOfRange {
                        key: LIMIT_KEY.to_string(),
                        reason: "must be greater than zero",
                    })?;
                limit.min(defaults.max_page_size.max(1))
            }
            None => defaults.default_page_size.clamp(1, defaults.max_page_size.max(1)),
        };

        // OFFSET is bound as a signed 64-bit integer
        let within_offset = page
            .checked_mul(page_size)
            .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !within_offset {
            return Err(InvalidParameter::OutOfRange {
                key: PAGE_KEY.to_string(),
                reason: "page offset exceeds the addressable range",
            });
        }

        let order = match params.get(ORDER_BY_KEY) {
            Some(value) => parse_order(value)?,
            None => Vec::new(),
        };
        let order = if order.is_empty() {
            defaults.default_order.clone()
        } else {
            order
        };

        let mut filters = Vec::new();
        for (key, value) in params {
            match key.as_str() {
                QUERY_KEY => filters.extend(parse_filter_list(value)?),
                reserved if RESERVED_KEYS.contains(&reserved) => {}
                _ => filters.push(implicit_equality(key, value)?),
            }
        }

        Ok(Self {
            filters,
            order,
            window: PageWindow { page, page_size },
        })
    }
}

/// Accepts JSON integers, integral floats and decimal strings. Well-formed
/// integers beyond the `i64` range saturate, so an oversized `_limit` is still
/// clamped rather than rejected.
#[allow(clippy::cast_possible_truncation)]
fn parse_integer(key: &str, value: &Value) -> Result<i64, InvalidParameter> {
    let not_an_integer = || InvalidParameter::NotAnInteger {
        key: key.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(int)
            } else {
                // `as` saturates at the i64 bounds
                number
                    .as_f64()
                    .filter(|float| float.is_finite() && float.fract() == 0.0)
                    .map(|float| float as i64)
                    .ok_or_else(not_an_integer)
            }
        }
        Value::String(text) => parse_decimal(text.trim()).ok_or_else(not_an_integer),
        _ => Err(not_an_integer()),
    }
}

fn parse_decimal(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(text.parse::<i64>().unwrap_or(if negative { i64::MIN } else { i64::MAX }))
}

fn parse_order(value: &Value) -> Result<Vec<OrderSpec>, InvalidParameter> {
    let Value::Object(fields) = value else {
        return Err(InvalidParameter::Malformed {
            key: ORDER_BY_KEY.to_string(),
            expected: "a mapping of field names to asc or desc",
        });
    };
    fields
        .iter()
        .map(|(field, token)| {
            let token = token.as_str().ok_or_else(|| InvalidParameter::UnknownDirection {
                field: field.clone(),
                token: token.to_string(),
            })?;
            Ok(OrderSpec::new(field.clone(), Direction::parse(field, token)?))
        })
        .collect()
}

/// `query` is normally a list; an index-keyed map (as produced by some form
/// encoders) is accepted in insertion order.
fn parse_filter_list(value: &Value) -> Result<Vec<FilterClause>, InvalidParameter> {
    let descriptors: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(items) => items.values().collect(),
        _ => {
            return Err(InvalidParameter::Malformed {
                key: QUERY_KEY.to_string(),
                expected: "a list of filter descriptors",
            });
        }
    };
    descriptors.into_iter().map(parse_filter).collect()
}

fn parse_filter(descriptor: &Value) -> Result<FilterClause, InvalidParameter> {
    let Value::Object(spec) = descriptor else {
        return Err(InvalidParameter::Malformed {
            key: QUERY_KEY.to_string(),
            expected: "filter descriptors to be mappings with a `type`",
        });
    };
    let filter_type = spec
        .get("type")
        .and_then(Value::as_str)
        .ok_or(InvalidParameter::MissingField {
            filter_type: "query",
            field: "type",
        })?;

    match filter_type {
        "eq" => Ok(FilterClause::Equality {
            field: required_field(spec, "eq")?,
            value: required(spec, "eq", "value")?.clone(),
        }),
        "between" => Ok(FilterClause::Between {
            field: required_field(spec, "between")?,
            from: required(spec, "between", "from")?.clone(),
            to: required(spec, "between", "to")?.clone(),
        }),
        "decimation" => {
            let field = required_field(spec, "decimation")?;
            let modulus = parse_integer("value", required(spec, "decimation", "value")?)?;
            if modulus <= 0 {
                return Err(InvalidParameter::OutOfRange {
                    key: "value".to_string(),
                    reason: "decimation modulus must be greater than zero",
                });
            }
            Ok(FilterClause::Decimation { field, modulus })
        }
        other => Err(InvalidParameter::UnknownFilterType(other.to_string())),
    }
}

fn required<'a>(
    spec: &'a Map<String, Value>,
    filter_type: &'static str,
    field: &'static str,
) -> Result<&'a Value, InvalidParameter> {
    spec.get(field)
        .ok_or(InvalidParameter::MissingField { filter_type, field })
}

fn required_field(
    spec: &Map<String, Value>,
    filter_type: &'static str,
) -> Result<String, InvalidParameter> {
    required(spec, filter_type, "field")?
        .as_str()
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .ok_or(InvalidParameter::MissingField {
            filter_type,
            field: "field",
        })
}

fn implicit_equality(key: &str, value: &Value) -> Result<FilterClause, InvalidParameter> {
    if value.is_object() || value.is_array() {
        return Err(InvalidParameter::Malformed {
            key: key.to_string(),
            expected: "a scalar value",
        });
    }
    Ok(FilterClause::Equality {
        field: key.to_string(),
        value: value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test params must be an object"),
        }
    }

    fn normalize(value: Value) -> Result<QueryRequest, InvalidParameter> {
        QueryRequest::from_params(&params(value), &ListDefaults::default())
    }

    #[test]
    fn test_defaults_when_empty() {
        let request = normalize(json!({})).unwrap();
        assert_eq!(request.window, PageWindow { page: 0, page_size: 25 });
        assert_eq!(request.order, vec![OrderSpec::new("id", Direction::Asc)]);
        assert!(request.filters.is_empty());
    }

    #[test]
    fn test_limit_is_clamped_to_max() {
        for requested in [101, 250, 10_000] {
            let request = normalize(json!({"_limit": requested, "_page": 3})).unwrap();
            assert_eq!(request.window.page_size, 100);
            assert_eq!(request.window.page, 3);
        }
    }

    #[test]
    fn test_limit_accepts_strings() {
        let request = normalize(json!({"_limit": "10", "_page": "2"})).unwrap();
        assert_eq!(request.window, PageWindow { page: 2, page_size: 10 });
        assert_eq!(request.window.offset(), 20);
    }

    #[test]
    fn test_non_positive_limit_rejected() {
        for bad in [json!(0), json!(-5), json!("0")] {
            let err = normalize(json!({"_limit": bad})).unwrap_err();
            assert!(matches!(err, InvalidParameter::OutOfRange { .. }), "{err}");
        }
    }

    #[test]
    fn test_non_integral_limit_rejected() {
        for bad in [json!(2.5), json!("ten"), json!(true), json!([1])] {
            let err = normalize(json!({"_limit": bad})).unwrap_err();
            assert!(matches!(err, InvalidParameter::NotAnInteger { .. }), "{err}");
        }
    }

    #[test]
    fn test_oversized_limit_is_clamped() {
        for requested in [json!("99999999999999999999"), json!(1e20), json!(u64::MAX)] {
            let request = normalize(json!({"_limit": requested})).unwrap();
            assert_eq!(request.window.page_size, 100);
        }
        let err = normalize(json!({"_limit": "-99999999999999999999"})).unwrap_err();
        assert!(matches!(err, InvalidParameter::OutOfRange { .. }), "{err}");
    }

    #[test]
    fn test_page_offset_must_fit_i64() {
        for page in [json!("400000000000000000"), json!("99999999999999999999"), json!(1e30)] {
            let err = normalize(json!({"_page": page, "_limit": 25})).unwrap_err();
            assert!(matches!(err, InvalidParameter::OutOfRange { .. }), "{err}");
        }

        // Largest page whose offset is still addressable
        let last = i64::MAX / 25;
        let request = normalize(json!({"_page": last, "_limit": 25})).unwrap();
        assert_eq!(request.window.offset(), u64::try_from(last * 25).unwrap());
    }

    #[test]
    fn test_negative_page_rejected() {
        let err = normalize(json!({"_page": -1})).unwrap_err();
        assert!(matches!(err, InvalidParameter::OutOfRange { .. }));
        assert!(normalize(json!({"_page": "1.5"})).is_err());
    }

    #[test]
    fn test_order_by_keeps_given_order_and_ignores_case() {
        let request =
            normalize(json!({"_orderBy": {"priority": "DESC", "title": "Asc"}})).unwrap();
        assert_eq!(
            request.order,
            vec![
                OrderSpec::new("priority", Direction::Desc),
                OrderSpec::new("title", Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_unknown_direction_rejected() {
        let err = normalize(json!({"_orderBy": {"title": "sideways"}})).unwrap_err();
        assert_eq!(
            err,
            InvalidParameter::UnknownDirection {
                field: "title".to_string(),
                token: "sideways".to_string()
            }
        );
    }

    #[test]
    fn test_filter_grammar() {
        let request = normalize(json!({
            "query": [
                {"type": "eq", "field": "title", "value": "Alpha"},
                {"type": "between", "field": "cycle_number", "from": 10, "to": 100},
                {"type": "decimation", "field": "cycle_number", "value": "10"}
            ]
        }))
        .unwrap();
        assert_eq!(
            request.filters,
            vec![
                FilterClause::Equality {
                    field: "title".to_string(),
                    value: json!("Alpha")
                },
                FilterClause::Between {
                    field: "cycle_number".to_string(),
                    from: json!(10),
                    to: json!(100)
                },
                FilterClause::Decimation {
                    field: "cycle_number".to_string(),
                    modulus: 10
                },
            ]
        );
    }

    #[test]
    fn test_unknown_filter_type_rejected() {
        let err = normalize(json!({"query": [{"type": "like", "field": "title", "value": "a"}]}))
            .unwrap_err();
        assert_eq!(err, InvalidParameter::UnknownFilterType("like".to_string()));
    }

    #[test]
    fn test_missing_sub_fields_rejected() {
        let err = normalize(json!({"query": [{"type": "between", "field": "priority", "from": 1}]}))
            .unwrap_err();
        assert_eq!(
            err,
            InvalidParameter::MissingField {
                filter_type: "between",
                field: "to"
            }
        );
        assert!(normalize(json!({"query": [{"field": "priority", "value": 1}]})).is_err());
        assert!(normalize(json!({"query": [{"type": "eq", "value": 1}]})).is_err());
    }

    #[test]
    fn test_zero_modulus_rejected() {
        let err = normalize(json!({"query": [{"type": "decimation", "field": "priority", "value": 0}]}))
            .unwrap_err();
        assert!(matches!(err, InvalidParameter::OutOfRange { .. }));
    }

    #[test]
    fn test_reserved_keys_never_become_filters() {
        let request = normalize(json!({
            "_page": 1,
            "_limit": 5,
            "_orderBy": {"title": "asc"},
            "query": [],
            "completed": "true",
            "priority": 3
        }))
        .unwrap();
        let fields: Vec<&str> = request.filters.iter().map(FilterClause::field).collect();
        assert_eq!(fields, vec!["completed", "priority"]);
    }

    #[test]
    fn test_implicit_filter_must_be_scalar() {
        assert!(normalize(json!({"title": {"nested": true}})).is_err());
        let request = normalize(json!({"notes": null})).unwrap();
        assert_eq!(
            request.filters,
            vec![FilterClause::Equality {
                field: "notes".to_string(),
                value: Value::Null
            }]
        );
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = ListDefaults {
            default_page_size: 10,
            max_page_size: 20,
            default_order: vec![OrderSpec::new("title", Direction::Desc)],
        };
        let request = QueryRequest::from_params(&params(json!({"_limit": 50})), &defaults).unwrap();
        assert_eq!(request.window.page_size, 20);
        assert_eq!(request.order, defaults.default_order);
    }
}
