use shelf_db::{Column, Migration, Relation, SearchField, TableSchema};

use crate::modules::comments::models::COMMENTS;

pub static POSTS: TableSchema = TableSchema {
    name: "posts",
    label: "post",
    columns: &[
        Column::id(),
        Column::varchar("title", 200).required(),
        Column::text("content").required(),
        Column::actor("author"),
        Column::created_at("created_at"),
        Column::updated_at("updated_at"),
    ],
    search: &[SearchField::Column("title"), SearchField::Column("content")],
    ordering: &["-created_at"],
    children: &[Relation {
        name: "comments",
        schema: &COMMENTS,
        foreign_key: "post",
    }],
};

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
    }]
}
