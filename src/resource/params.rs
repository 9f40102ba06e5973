//! Query-string parsing for list endpoints.

use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use shelf_db::{sql, Column, ColumnKind, ListQuery, Lookup, OrderBy, SqlValue, TableSchema};
use shelf_http::FieldErrors;

use super::validate;
use crate::utils;

pub const SEARCH: &str = "search";
pub const ORDERING: &str = "ordering";
pub const LIMIT: &str = "limit";
pub const OFFSET: &str = "offset";

/// Build a list query from raw `(key, value)` pairs.
///
/// Unknown keys, unknown lookups and unknown ordering fields are ignored.
/// Empty filter values are skipped. A value that cannot be read as the
/// column's type fails under its parameter name.
pub fn list_query(
    schema: &TableSchema,
    pairs: &[(String, String)],
    max_limit: u32,
) -> Result<ListQuery, FieldErrors> {
    let mut query = ListQuery::new();
    let mut errors = FieldErrors::new();
    let mut ordering: Option<Vec<OrderBy>> = None;

    for (key, raw) in pairs {
        match key.as_str() {
            SEARCH => {
                query.search.extend(search_terms(raw));
            }
            ORDERING => {
                let parsed: Vec<OrderBy> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .filter_map(|t| sql::parse_order(schema, t))
                    .collect();
                if !parsed.is_empty() {
                    ordering = Some(parsed);
                }
            }
            LIMIT => match raw.trim().parse::<u64>() {
                Ok(0) => errors.push(LIMIT, "Ensure this value is greater than or equal to 1."),
                Ok(n) => query.limit = Some(saturate(n).min(max_limit.max(1))),
                Err(_) => errors.push(LIMIT, "A valid integer is required."),
            },
            OFFSET => match raw.trim().parse::<u64>() {
                Ok(n) => query.offset = Some(saturate(n)),
                Err(_) => errors.push(OFFSET, "A valid integer is required."),
            },
            _ => {
                let Some((column, lookup)) = resolve_filter(schema, key) else {
                    continue;
                };
                if raw.is_empty() {
                    continue;
                }
                match filter_value(column, raw) {
                    Ok(value) => query = query.filter(column.name, lookup, value),
                    Err(message) => errors.push(key.as_str(), message),
                }
            }
        }
    }

    query.ordering = ordering.unwrap_or_else(|| default_ordering(schema));
    if errors.is_empty() {
        Ok(query)
    } else {
        Err(errors)
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Search terms split on whitespace and commas.
pub fn search_terms(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn default_ordering(schema: &TableSchema) -> Vec<OrderBy> {
    schema
        .ordering
        .iter()
        .filter_map(|token| sql::parse_order(schema, token))
        .collect()
}

/// `field` or `field__lookup`, resolved against the schema.
fn resolve_filter(schema: &TableSchema, key: &str) -> Option<(&'static Column, Lookup)> {
    let (name, lookup) = match key.split_once("__") {
        Some((name, suffix)) => (name, Lookup::parse(suffix)?),
        None => (key, Lookup::Exact),
    };
    let column = schema.column(name)?;
    lookup.supports(column.kind).then_some((column, lookup))
}

fn filter_value(column: &Column, raw: &str) -> Result<SqlValue, &'static str> {
    let trimmed = raw.trim();
    match column.kind {
        ColumnKind::Id | ColumnKind::Integer | ColumnKind::Reference { .. } => trimmed
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| "Enter a whole number."),
        ColumnKind::Decimal { .. } => validate::decimal(&Value::String(trimmed.to_string()))
            .and_then(|d| d.to_f64())
            .map(SqlValue::Real)
            .ok_or("Enter a number."),
        ColumnKind::Date => utils::parse_date(trimmed)
            .map(|d| SqlValue::Text(utils::format_date(d)))
            .ok_or("Enter a valid date."),
        ColumnKind::Timestamp => utils::parse_timestamp(trimmed)
            .map(|t| SqlValue::Text(utils::format_timestamp(t)))
            .ok_or("Enter a valid date/time."),
        ColumnKind::Text { .. } => Ok(SqlValue::Text(raw.to_string())),
    }
}
