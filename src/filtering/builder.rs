//! Binding a [`QueryRequest`] to the columns of a concrete entity.
//!
//! Field names are resolved against the entity's columns before anything runs,
//! so an unknown field is reported as [`InvalidParameter::UnknownField`] rather
//! than surfacing as a database error. Clause values arrive untyped (query
//! strings only carry text) and are coerced by the column's declared type.
//! Temporal columns take ISO 8601 text: `2024-03-01` for dates, and
//! `2024-03-01T12:30:00` or RFC 3339 for timestamps.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use sea_orm::{
    ColumnTrait, ColumnType, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Value as DbValue,
    sea_query::{BinOper, Expr, SimpleExpr},
};
use serde_json::Value;
use uuid::Uuid;

use super::{FilterClause, InvalidParameter, OrderSpec, PageWindow, QueryRequest};
use crate::core::Resource;

type ColumnOf<R> = <<R as Resource>::EntityType as EntityTrait>::Column;

/// A list query ready to execute.
pub struct BuiltQuery<R: Resource> {
    /// Filtered, ordered and windowed select
    pub select: Select<R::EntityType>,
    /// AND of every clause, for counting the filtered set without the window
    pub condition: Condition,
    pub window: PageWindow,
    /// Clauses in the condition (explicit `query` entries plus implicit keys)
    pub predicate_count: usize,
}

/// Build the select for one list call.
///
/// # Errors
///
/// Returns [`InvalidParameter`] when a filter or order names a field the entity
/// does not have, or when a value cannot be coerced to the column's type.
pub fn build_query<R: Resource>(
    request: &QueryRequest,
) -> Result<BuiltQuery<R>, InvalidParameter> {
    let mut condition = Condition::all();
    for clause in &request.filters {
        condition = condition.add(predicate::<R>(clause)?);
    }

    let mut select = R::EntityType::find().filter(condition.clone());
    for spec in &request.order {
        select = apply_order::<R>(select, spec)?;
    }
    let select = select
        .offset(request.window.offset())
        .limit(request.window.page_size);

    tracing::trace!(
        resource = R::RESOURCE_NAME_PLURAL,
        predicates = request.filters.len(),
        page = request.window.page,
        page_size = request.window.page_size,
        "Built list query"
    );

    Ok(BuiltQuery {
        select,
        condition,
        window: request.window,
        predicate_count: request.filters.len(),
    })
}

fn resolve_column<R: Resource>(field: &str) -> Result<ColumnOf<R>, InvalidParameter> {
    ColumnOf::<R>::from_str(field).map_err(|_| InvalidParameter::UnknownField {
        field: field.to_string(),
        resource: R::RESOURCE_NAME_SINGULAR.to_string(),
    })
}

fn apply_order<R: Resource>(
    select: Select<R::EntityType>,
    spec: &OrderSpec,
) -> Result<Select<R::EntityType>, InvalidParameter> {
    let column = resolve_column::<R>(&spec.field)?;
    Ok(select.order_by(column, spec.direction.into()))
}

fn predicate<R: Resource>(clause: &FilterClause) -> Result<SimpleExpr, InvalidParameter> {
    let column = resolve_column::<R>(clause.field())?;
    let column_type = column.def().get_column_type().clone();

    match clause {
        FilterClause::Equality { field, value } => {
            if value.is_null() {
                return Ok(column.is_null());
            }
            Ok(column.eq(coerce(field, &column_type, value)?))
        }
        FilterClause::Between { field, from, to } => {
            let from = coerce_bound(field, &column_type, from)?;
            let to = coerce_bound(field, &column_type, to)?;
            Ok(column.between(from, to))
        }
        FilterClause::Decimation { field, modulus } => {
            if !is_integer(&column_type) {
                return Err(InvalidParameter::TypeMismatch {
                    field: field.clone(),
                    expected: "an integer column for decimation",
                    value: format!("{column_type:?}"),
                });
            }
            // field mod N = 0
            let remainder =
                Expr::col((R::EntityType::default(), column)).binary(BinOper::Mod, *modulus);
            Ok(Expr::expr(remainder).eq(0))
        }
    }
}

fn coerce_bound(
    field: &str,
    column_type: &ColumnType,
    value: &Value,
) -> Result<DbValue, InvalidParameter> {
    if value.is_null() {
        return Err(InvalidParameter::TypeMismatch {
            field: field.to_string(),
            expected: "a non-null bound",
            value: "null".to_string(),
        });
    }
    coerce(field, column_type, value)
}

const fn is_integer(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned
    )
}

/// Convert a JSON scalar into a bind value for `column_type`.
fn coerce(
    field: &str,
    column_type: &ColumnType,
    value: &Value,
) -> Result<DbValue, InvalidParameter> {
    let mismatch = |expected: &'static str| InvalidParameter::TypeMismatch {
        field: field.to_string(),
        expected,
        value: value.to_string(),
    };

    if value.is_object() || value.is_array() {
        return Err(mismatch("a scalar value"));
    }

    match column_type {
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::TinyUnsigned
        | ColumnType::SmallUnsigned => {
            let int = as_integer(value).ok_or_else(|| mismatch("an integer"))?;
            i32::try_from(int)
                .map(DbValue::from)
                .map_err(|_| mismatch("a 32-bit integer"))
        }
        ColumnType::BigInteger | ColumnType::Unsigned | ColumnType::BigUnsigned => as_integer(value)
            .map(DbValue::from)
            .ok_or_else(|| mismatch("an integer")),
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) | ColumnType::Money(_) => {
            as_float(value)
                .map(DbValue::from)
                .ok_or_else(|| mismatch("a number"))
        }
        ColumnType::Boolean => as_bool(value)
            .map(DbValue::from)
            .ok_or_else(|| mismatch("a boolean")),
        ColumnType::Uuid => value
            .as_str()
            .and_then(|text| Uuid::parse_str(text.trim()).ok())
            .map(DbValue::from)
            .ok_or_else(|| mismatch("a UUID")),
        ColumnType::Date => as_date(value)
            .map(DbValue::from)
            .ok_or_else(|| mismatch("a date (YYYY-MM-DD)")),
        ColumnType::Time => as_time(value)
            .map(DbValue::from)
            .ok_or_else(|| mismatch("a time (HH:MM:SS)")),
        ColumnType::DateTime | ColumnType::Timestamp => as_datetime(value)
            .map(DbValue::from)
            .ok_or_else(|| mismatch("a timestamp")),
        ColumnType::TimestampWithTimeZone => as_datetime_tz(value)
            .map(DbValue::from)
            .ok_or_else(|| mismatch("a timestamp with offset")),
        _ => Ok(DbValue::from(as_text(value))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < 9.0e15)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    value.as_str()?.trim().parse().ok()
}

fn as_time(value: &Value) -> Option<NaiveTime> {
    value.as_str()?.trim().parse().ok()
}

/// Offset timestamps are normalized to UTC; a bare date means midnight.
fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    let text = value.as_str()?.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.naive_utc());
    }
    text.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| as_date(value).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

/// Timestamps without an offset are read as UTC.
fn as_datetime_tz(value: &Value) -> Option<DateTime<FixedOffset>> {
    let text = value.as_str()?.trim();
    DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| as_datetime(value).map(|naive| naive.and_utc().fixed_offset()))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
