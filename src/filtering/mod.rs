//! # List Queries
//!
//! Turns the untyped parameters of a collection GET into one paginated,
//! filtered, ordered select.
//!
//! ## Flow
//!
//! 1. [`parse_query_string`] decodes the raw query string into a parameter map
//! 2. [`QueryRequest::from_params`] normalizes the map against [`ListDefaults`]
//! 3. [`build_query`] binds the request to an entity's columns
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Second page of ten, newest cycle first
//! GET /tasks?_page=1&_limit=10&_orderBy[cycle_number]=desc
//!
//! // Implicit equality on any non-reserved key
//! GET /tasks?completed=true
//!
//! // Inclusive range, then every 10th row of it
//! GET /tasks?query[0][type]=between&query[0][field]=cycle_number&query[0][from]=10&query[0][to]=100
//!           &query[1][type]=decimation&query[1][field]=cycle_number&query[1][value]=10
//! ```
//!
//! All clauses are AND-combined. `_limit` is clamped to
//! [`ListDefaults::max_page_size`] without error.

pub mod builder;
pub mod error;
pub mod pagination;
pub mod params;
pub mod query_string;

pub use builder::{BuiltQuery, build_query};
pub use error::InvalidParameter;
pub use pagination::{PageMeta, calculate_content_range};
pub use params::{
    Direction, FilterClause, ListDefaults, OrderSpec, PageWindow, QueryRequest, RESERVED_KEYS,
};
pub use query_string::parse_query_string;
