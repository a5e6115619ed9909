use thiserror::Error;

/// Malformed list input: pagination, ordering or a filter clause.
///
/// Raised both while normalizing the raw parameter map and while binding
/// clauses to the columns of a concrete entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidParameter {
    #[error("`{key}` must be an integer, got {value}")]
    NotAnInteger { key: String, value: String },

    #[error("`{key}` is out of range: {reason}")]
    OutOfRange { key: String, reason: &'static str },

    #[error("`{key}` must be {expected}")]
    Malformed { key: String, expected: &'static str },

    #[error("unknown sort direction `{token}` for field `{field}` (expected asc or desc)")]
    UnknownDirection { field: String, token: String },

    #[error("unknown filter type `{0}` (expected eq, between or decimation)")]
    UnknownFilterType(String),

    #[error("`{filter_type}` filter is missing `{field}`")]
    MissingField {
        filter_type: &'static str,
        field: &'static str,
    },

    #[error("`{field}` is not a field of {resource}")]
    UnknownField { field: String, resource: String },

    #[error("`{field}` expects {expected}, got {value}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        value: String,
    },
}
