//! Request body validation driven by the table schema.
//!
//! Every writable column is checked and every failure is collected, so a
//! client sees all of its mistakes in one response.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use shelf_db::{Changes, Column, ColumnDefault, ColumnKind, SqlValue, TableSchema};
use shelf_http::FieldErrors;
use time::Date;

use crate::utils;

pub const REQUIRED: &str = "This field is required.";
pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_BLANK: &str = "This field may not be blank.";

/// How absent fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Required fields must be present; defaults fill the rest.
    Create,
    /// Full update: required fields must be present, nothing is defaulted.
    Replace,
    /// Only the supplied fields are validated and changed.
    Partial,
}

/// Validate `body` against the writable columns of `schema`.
///
/// Unknown keys and read-only columns are ignored. The returned changes only
/// hold values that passed their column checks.
pub fn validate_body(
    schema: &TableSchema,
    body: &Map<String, Value>,
    mode: Mode,
    today: Date,
    errors: &mut FieldErrors,
) -> Changes {
    let mut changes = Changes::new();

    for column in schema.writable_columns() {
        match body.get(column.name) {
            None => {
                if mode == Mode::Partial {
                    continue;
                }
                match column.default {
                    Some(default) if mode == Mode::Create => {
                        changes.set(column.name, default_value(default, today));
                    }
                    Some(_) => {}
                    None if column.required => errors.push(column.name, REQUIRED),
                    None => {}
                }
            }
            Some(Value::Null) => {
                if column.required || column.default.is_some() {
                    errors.push(column.name, NOT_NULL);
                } else {
                    changes.set(column.name, SqlValue::Null);
                }
            }
            Some(value) => match coerce(column, value) {
                Ok(value) => changes.set(column.name, value),
                Err(message) => errors.push(column.name, message),
            },
        }
    }

    changes
}

fn default_value(default: ColumnDefault, today: Date) -> SqlValue {
    match default {
        ColumnDefault::Today => SqlValue::Text(utils::format_date(today)),
    }
}

/// Convert one JSON value into its stored form, or the message explaining
/// why it cannot be stored.
pub fn coerce(column: &Column, value: &Value) -> Result<SqlValue, String> {
    match column.kind {
        ColumnKind::Integer => {
            let n = integer(value).ok_or("A valid integer is required.")?;
            check_min(column, Decimal::from(n))?;
            Ok(SqlValue::Integer(n))
        }
        ColumnKind::Reference { .. } => integer(value).map(SqlValue::Integer).ok_or_else(|| {
            format!(
                "Incorrect type. Expected pk value, received {}.",
                json_type_name(value)
            )
        }),
        ColumnKind::Text { max_length } => text(column, value, max_length),
        ColumnKind::Decimal {
            max_digits,
            decimal_places,
        } => {
            let d = decimal(value).ok_or("A valid number is required.")?;
            let stored = check_precision(d, max_digits, decimal_places)?;
            check_min(column, d)?;
            Ok(SqlValue::Text(stored))
        }
        ColumnKind::Date => value
            .as_str()
            .and_then(|s| utils::parse_date(s.trim()))
            .map(|d| SqlValue::Text(utils::format_date(d)))
            .ok_or_else(|| {
                "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.".to_string()
            }),
        ColumnKind::Id | ColumnKind::Timestamp => Err("This field is read-only.".to_string()),
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(column: &Column, value: &Value, max_length: Option<usize>) -> Result<SqlValue, String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err("Not a valid string.".to_string()),
    };
    if s.is_empty() {
        // Optional text columns store blanks as NULL so unique columns do
        // not collide on "".
        return if column.required {
            Err(NOT_BLANK.to_string())
        } else {
            Ok(SqlValue::Null)
        };
    }
    if let Some(max) = max_length {
        if s.chars().count() > max {
            return Err(format!(
                "Ensure this field has no more than {max} characters."
            ));
        }
    }
    Ok(SqlValue::Text(s))
}

pub(crate) fn decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// Enforce digit limits and render the canonical stored text, e.g. `24.50`.
fn check_precision(d: Decimal, max_digits: u32, decimal_places: u32) -> Result<String, String> {
    let normalized = d.normalize();
    let places = normalized.scale();
    let whole = normalized.abs().trunc();
    let whole_digits = if whole.is_zero() {
        0
    } else {
        whole.to_string().len() as u32
    };

    if whole_digits + places > max_digits {
        return Err(format!(
            "Ensure that there are no more than {max_digits} digits in total."
        ));
    }
    if places > decimal_places {
        return Err(format!(
            "Ensure that there are no more than {decimal_places} decimal places."
        ));
    }
    if whole_digits > max_digits.saturating_sub(decimal_places) {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_digits.saturating_sub(decimal_places)
        ));
    }

    let mut stored = normalized;
    stored.rescale(decimal_places);
    Ok(stored.to_string())
}

fn check_min(column: &Column, value: Decimal) -> Result<(), String> {
    match column.min_value {
        Some(min) if value < Decimal::from(min) => Err(format!(
            "Ensure this value is greater than or equal to {min}."
        )),
        _ => Ok(()),
    }
}

/// Type names as reported in pk errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
