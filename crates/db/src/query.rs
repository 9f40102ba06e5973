//! Typed list queries: filters, search terms, ordering and pagination.

use crate::schema::ColumnKind;
use crate::value::SqlValue;

/// Comparison applied by a filter, named after the `__` suffix it is parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Lookup {
    pub fn parse(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::IExact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
        }
    }

    /// Whether this lookup makes sense for a column of `kind`.
    pub const fn supports(self, kind: ColumnKind) -> bool {
        match kind {
            ColumnKind::Text { .. } => matches!(
                self,
                Lookup::Exact | Lookup::IExact | Lookup::Contains | Lookup::IContains
            ),
            ColumnKind::Reference { .. } => matches!(self, Lookup::Exact),
            ColumnKind::Id
            | ColumnKind::Integer
            | ColumnKind::Decimal { .. }
            | ColumnKind::Date
            | ColumnKind::Timestamp => matches!(
                self,
                Lookup::Exact | Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte
            ),
        }
    }

    /// Case-insensitive lookups compare against an ASCII-lowercased operand.
    pub const fn folds_case(self) -> bool {
        matches!(self, Lookup::IExact | Lookup::IContains)
    }

    /// All lookups valid for `kind`, in a stable order.
    pub fn for_kind(kind: ColumnKind) -> impl Iterator<Item = Lookup> {
        [
            Lookup::Exact,
            Lookup::IExact,
            Lookup::Contains,
            Lookup::IContains,
            Lookup::Gt,
            Lookup::Gte,
            Lookup::Lt,
            Lookup::Lte,
        ]
        .into_iter()
        .filter(move |l| l.supports(kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub lookup: Lookup,
    pub value: SqlValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// A list request against one table. Column names are resolved against the
/// table schema before a query is built, so they are safe to interpolate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    /// Every term must match at least one search field.
    pub search: Vec<String>,
    pub ordering: Vec<OrderBy>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: &'static str, lookup: Lookup, value: impl Into<SqlValue>) -> Self {
        self.filters.push(Filter {
            column,
            lookup,
            value: value.into(),
        });
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search.push(term.into());
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.ordering.push(order);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_round_trips_through_its_suffix() {
        for lookup in Lookup::for_kind(ColumnKind::Text { max_length: None }) {
            assert_eq!(Lookup::parse(lookup.as_str()), Some(lookup));
        }
        assert_eq!(Lookup::parse("startswith"), None);
    }

    #[test]
    fn lookups_depend_on_column_kind() {
        let text = ColumnKind::Text { max_length: None };
        assert!(Lookup::IContains.supports(text));
        assert!(!Lookup::Gte.supports(text));
        assert!(Lookup::Gte.supports(ColumnKind::Integer));
        assert!(!Lookup::IContains.supports(ColumnKind::Date));
        assert!(!Lookup::Lt.supports(ColumnKind::Reference { table: "authors" }));
    }
}
