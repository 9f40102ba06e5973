use shelf_db::{Column, Migration, SearchField, TableSchema};

pub static BOOKS: TableSchema = TableSchema {
    name: "books",
    label: "book",
    columns: &[
        Column::id(),
        Column::varchar("title", 200).required(),
        Column::reference("author", "authors").required(),
        Column::integer("publication_year").required().min_value(0),
        Column::date("publication_date"),
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

pub fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE books (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    author INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                    publication_year INTEGER NOT NULL CHECK (publication_year >= 0),
                    publication_date TEXT,
                    isbn TEXT UNIQUE,
                    price TEXT NOT NULL
                );
                "#,
        },
        Migration {
            id: "002_author_index",
            up: "CREATE INDEX books_author_idx ON books (author);",
        },
    ]
}
