//! Builds parameterized SELECT, INSERT, UPDATE and DELETE statements from a
//! [`TableSchema`]. Identifiers only ever come from static schemas; every
//! value goes through a `?` placeholder.

use crate::query::{ListQuery, Lookup, OrderBy};
use crate::schema::{ColumnKind, SearchField, TableSchema};
use crate::value::{Changes, SqlValue};

/// Hard ceiling applied to any `LIMIT`.
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlValue) -> &'static str {
        self.params.push(v);
        "?"
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(table: &str, column: &str) -> String {
    format!("{}.{}", quoted(table), quoted(column))
}

/// Column expression used for comparisons and ordering. Decimals are stored
/// as text and compared as numbers.
fn compare_expr(schema: &TableSchema, column: &str) -> String {
    let q = qualified(schema.name, column);
    match schema.column(column).map(|c| c.kind) {
        Some(ColumnKind::Decimal { .. }) => format!("CAST({} AS REAL)", q),
        _ => q,
    }
}

fn select_column_list(schema: &TableSchema) -> String {
    schema
        .columns
        .iter()
        .map(|c| format!("{} AS {}", qualified(schema.name, c.name), quoted(c.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn returning_list(schema: &TableSchema) -> String {
    schema
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn filter_clause(q: &mut QueryBuf, schema: &TableSchema, column: &str, lookup: Lookup, value: &SqlValue) -> String {
    let expr = compare_expr(schema, column);
    let value = match (lookup.folds_case(), value) {
        (true, SqlValue::Text(s)) => SqlValue::Text(s.to_ascii_lowercase()),
        (_, v) => v.clone(),
    };
    let ph = q.push_param(value);
    match lookup {
        Lookup::Exact => format!("{} = {}", expr, ph),
        Lookup::IExact => format!("LOWER({}) = {}", expr, ph),
        Lookup::Contains => format!("instr({}, {}) > 0", expr, ph),
        Lookup::IContains => format!("instr(LOWER({}), {}) > 0", expr, ph),
        Lookup::Gt => format!("{} > {}", expr, ph),
        Lookup::Gte => format!("{} >= {}", expr, ph),
        Lookup::Lt => format!("{} < {}", expr, ph),
        Lookup::Lte => format!("{} <= {}", expr, ph),
    }
}

/// One search term ORed across every search field of the table.
fn search_clause(q: &mut QueryBuf, schema: &TableSchema, term: &str) -> Option<String> {
    let term = term.to_ascii_lowercase();
    let parts: Vec<String> = schema
        .search
        .iter()
        .map(|field| match *field {
            SearchField::Column(column) => {
                let ph = q.push_param(SqlValue::Text(term.clone()));
                format!("instr(LOWER({}), {}) > 0", qualified(schema.name, column), ph)
            }
            SearchField::Related {
                column,
                table,
                target,
            } => {
                let ph = q.push_param(SqlValue::Text(term.clone()));
                format!(
                    "EXISTS (SELECT 1 FROM {} AS \"rel\" WHERE \"rel\".\"id\" = {} AND instr(LOWER(\"rel\".{}), {}) > 0)",
                    quoted(table),
                    qualified(schema.name, column),
                    quoted(target),
                    ph
                )
            }
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("({})", parts.join(" OR ")))
    }
}

fn order_clause(schema: &TableSchema, ordering: &[OrderBy]) -> String {
    let mut parts: Vec<String> = ordering
        .iter()
        .filter(|o| schema.column(o.column).is_some())
        .map(|o| {
            format!(
                "{} {}",
                compare_expr(schema, o.column),
                if o.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    // id breaks ties so that pagination and repeated reads agree.
    if !ordering.iter().any(|o| o.column == "id") {
        parts.push(format!("{} ASC", qualified(schema.name, "id")));
    }
    format!(" ORDER BY {}", parts.join(", "))
}

/// SELECT rows matching every filter and search term, in the requested order.
pub fn select_list(schema: &TableSchema, query: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();

    for filter in &query.filters {
        if schema.column(filter.column).is_none() {
            continue;
        }
        let clause = filter_clause(&mut q, schema, filter.column, filter.lookup, &filter.value);
        where_parts.push(clause);
    }
    for term in query.search.iter().filter(|t| !t.is_empty()) {
        if let Some(clause) = search_clause(&mut q, schema, term) {
            where_parts.push(clause);
        }
    }

    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let limit_clause = match (query.limit, query.offset) {
        (Some(n), Some(off)) => format!(" LIMIT {} OFFSET {}", n.min(MAX_LIMIT), off),
        (Some(n), None) => format!(" LIMIT {}", n.min(MAX_LIMIT)),
        (None, Some(off)) => format!(" LIMIT -1 OFFSET {}", off),
        (None, None) => String::new(),
    };

    q.sql = format!(
        "SELECT {} FROM {}{}{}{}",
        select_column_list(schema),
        quoted(schema.name),
        where_clause,
        order_clause(schema, &query.ordering),
        limit_clause
    );
    q
}

/// SELECT by primary key. Caller binds the id as sole param.
pub fn select_by_id(schema: &TableSchema) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ?",
        select_column_list(schema),
        quoted(schema.name),
        qualified(schema.name, "id")
    );
    q
}

/// SELECT rows whose `column` is one of `values`, ordered by the table's
/// default ordering. Used for batch-loading nested children.
pub fn select_by_column_in(schema: &TableSchema, column: &str, values: &[i64]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols = select_column_list(schema);
    if values.is_empty() {
        q.sql = format!("SELECT {} FROM {} WHERE 1 = 0", cols, quoted(schema.name));
        return q;
    }
    let placeholders: Vec<&str> = values
        .iter()
        .map(|v| q.push_param(SqlValue::Integer(*v)))
        .collect();
    let ordering: Vec<OrderBy> = schema.ordering.iter().filter_map(|o| parse_order(schema, o)).collect();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({}){}",
        cols,
        quoted(schema.name),
        qualified(schema.name, column),
        placeholders.join(", "),
        order_clause(schema, &ordering)
    );
    q
}

/// Resolve a `-`-prefixed ordering token against the schema.
pub fn parse_order(schema: &TableSchema, token: &str) -> Option<OrderBy> {
    let (name, descending) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    schema.column(name.trim()).map(|c| OrderBy {
        column: c.name,
        descending,
    })
}

/// INSERT the given assignments and return the stored row.
pub fn insert(schema: &TableSchema, changes: &Changes) -> QueryBuf {
    let mut q = QueryBuf::new();
    if changes.is_empty() {
        q.sql = format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(schema.name),
            returning_list(schema)
        );
        return q;
    }
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (column, value) in changes.iter() {
        if schema.column(column).is_none() {
            continue;
        }
        cols.push(quoted(column));
        placeholders.push(q.push_param(value.clone()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(schema.name),
        cols.join(", "),
        placeholders.join(", "),
        returning_list(schema)
    );
    q
}

/// UPDATE by id: SET only the assigned columns, never the primary key.
/// With nothing to set this degrades to a SELECT of the row.
pub fn update(schema: &TableSchema, id: i64, changes: &Changes) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (column, value) in changes.iter() {
        if column == "id" || schema.column(column).is_none() {
            continue;
        }
        let ph = q.push_param(value.clone());
        sets.push(format!("{} = {}", quoted(column), ph));
    }
    if sets.is_empty() {
        let mut select = select_by_id(schema);
        select.params.push(SqlValue::Integer(id));
        return select;
    }
    q.push_param(SqlValue::Integer(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
        quoted(schema.name),
        sets.join(", "),
        quoted("id"),
        returning_list(schema)
    );
    q
}

/// DELETE by id. Caller binds the id.
pub fn delete(schema: &TableSchema) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {} WHERE {} = ?", quoted(schema.name), quoted("id"));
    q
}

/// SELECT 1 when a row of `table` has `column = value`, optionally ignoring
/// the row `excluding`.
pub fn exists(table: &str, column: &str, value: &SqlValue, excluding: Option<i64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(value.clone());
    let mut sql = format!(
        "SELECT 1 FROM {} WHERE {} = ?",
        quoted(table),
        quoted(column)
    );
    if let Some(id) = excluding {
        q.push_param(SqlValue::Integer(id));
        sql.push_str(&format!(" AND {} <> ?", quoted("id")));
    }
    sql.push_str(" LIMIT 1");
    q.sql = sql;
    q
}
