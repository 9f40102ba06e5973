use shelf_db::{Column, Migration, Relation, SearchField, TableSchema};

use crate::modules::books::models::BOOKS;

pub static AUTHORS: TableSchema = TableSchema {
    name: "authors",
    label: "author",
    columns: &[Column::id(), Column::varchar("name", 100).required()],
    search: &[SearchField::Column("name")],
    ordering: &[],
    children: &[Relation {
        name: "books",
        schema: &BOOKS,
        foreign_key: "author",
    }],
};

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );
            "#,
    }]
}
