//! Static table declarations driving SQL generation, validation and docs.

/// Storage and wire type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Auto-generated integer primary key.
    Id,
    Integer,
    Text {
        max_length: Option<usize>,
    },
    /// Stored as canonical decimal text, compared numerically.
    Decimal {
        max_digits: u32,
        decimal_places: u32,
    },
    /// `YYYY-MM-DD` text.
    Date,
    /// RFC 3339 UTC text.
    Timestamp,
    /// Integer id of a row in another table.
    Reference {
        table: &'static str,
    },
}

impl ColumnKind {
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            ColumnKind::Id | ColumnKind::Integer | ColumnKind::Reference { .. }
        )
    }
}

/// Where a column's value comes from on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Supplied by the client.
    Input,
    /// Assigned by the database.
    Generated,
    /// Set once, at insert time.
    CreatedAt,
    /// Refreshed on every write.
    UpdatedAt,
    /// Username of the actor performing the insert.
    Actor,
}

/// Default applied when a client omits an input column on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    Today,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub source: Source,
    pub required: bool,
    pub unique: bool,
    pub min_value: Option<i64>,
    pub default: Option<ColumnDefault>,
}

impl Column {
    const fn base(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            source: Source::Input,
            required: false,
            unique: false,
            min_value: None,
            default: None,
        }
    }

    pub const fn id() -> Self {
        Self {
            source: Source::Generated,
            ..Self::base("id", ColumnKind::Id)
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::base(name, ColumnKind::Integer)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::base(name, ColumnKind::Text { max_length: None })
    }

    pub const fn varchar(name: &'static str, max_length: usize) -> Self {
        Self::base(
            name,
            ColumnKind::Text {
                max_length: Some(max_length),
            },
        )
    }

    pub const fn decimal(name: &'static str, max_digits: u32, decimal_places: u32) -> Self {
        Self::base(
            name,
            ColumnKind::Decimal {
                max_digits,
                decimal_places,
            },
        )
    }

    pub const fn date(name: &'static str) -> Self {
        Self::base(name, ColumnKind::Date)
    }

    pub const fn reference(name: &'static str, table: &'static str) -> Self {
        Self::base(name, ColumnKind::Reference { table })
    }

    pub const fn created_at(name: &'static str) -> Self {
        Self {
            source: Source::CreatedAt,
            ..Self::base(name, ColumnKind::Timestamp)
        }
    }

    pub const fn updated_at(name: &'static str) -> Self {
        Self {
            source: Source::UpdatedAt,
            ..Self::base(name, ColumnKind::Timestamp)
        }
    }

    /// Text column filled with the acting username.
    pub const fn actor(name: &'static str) -> Self {
        Self {
            source: Source::Actor,
            ..Self::base(name, ColumnKind::Text { max_length: None })
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn min_value(mut self, min: i64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub const fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn is_writable(&self) -> bool {
        matches!(self.source, Source::Input)
    }
}

/// A column searched by the `search` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Column(&'static str),
    /// `target` on the row of `table` referenced by `column`.
    Related {
        column: &'static str,
        table: &'static str,
        target: &'static str,
    },
}

/// Child rows nested into each parent record under `name`.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub schema: &'static TableSchema,
    pub foreign_key: &'static str,
}

#[derive(Debug)]
pub struct TableSchema {
    /// Table name, also the URL segment.
    pub name: &'static str,
    /// Singular human label, e.g. `book`.
    pub label: &'static str,
    pub columns: &'static [Column],
    pub search: &'static [SearchField],
    /// Default ordering, `-` prefix for descending.
    pub ordering: &'static [&'static str],
    pub children: &'static [Relation],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn writable_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns.iter().filter(|c| c.is_writable())
    }

    /// Title-cased label used for OpenAPI component names.
    pub fn component_name(&self) -> String {
        let mut chars = self.label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub static AUTHORS: TableSchema = TableSchema {
        name: "authors",
        label: "author",
        columns: &[Column::id(), Column::varchar("name", 100).required()],
        search: &[SearchField::Column("name")],
        ordering: &["name"],
        children: &[Relation {
            name: "books",
            schema: &BOOKS,
            foreign_key: "author",
        }],
    };

    pub static BOOKS: TableSchema = TableSchema {
        name: "books",
        label: "book",
        columns: &[
            Column::id(),
            Column::varchar("title", 200).required(),
            Column::reference("author", "authors").required(),
            Column::integer("publication_year").required(),
            Column::varchar("isbn", 13).unique(),
            Column::decimal("price", 6, 2).required().min_value(0),
        ],
        search: &[
            SearchField::Column("title"),
            SearchField::Related {
                column: "author",
                table: "authors",
                target: "name",
            },
        ],
        ordering: &["title"],
        children: &[],
    };

    pub const DDL: &str = r#"
        CREATE TABLE authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );
        CREATE TABLE books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
            publication_year INTEGER NOT NULL,
            isbn TEXT UNIQUE,
            price TEXT NOT NULL
        );
    "#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::BOOKS;
    use super::*;

    #[test]
    fn builder_sets_constraints() {
        let price = BOOKS.column("price").copied();
        assert_eq!(
            price,
            Some(Column {
                name: "price",
                kind: ColumnKind::Decimal {
                    max_digits: 6,
                    decimal_places: 2
                },
                source: Source::Input,
                required: true,
                unique: false,
                min_value: Some(0),
                default: None,
            })
        );
    }

    #[test]
    fn id_is_not_writable() {
        let writable: Vec<_> = BOOKS.writable_columns().map(|c| c.name).collect();
        assert_eq!(
            writable,
            ["title", "author", "publication_year", "isbn", "price"]
        );
    }

    #[test]
    fn component_name_is_title_cased() {
        assert_eq!(BOOKS.component_name(), "Book");
    }
}
