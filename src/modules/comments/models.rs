use shelf_db::{Column, Migration, SearchField, TableSchema};

pub static COMMENTS: TableSchema = TableSchema {
    name: "comments",
    label: "comment",
    columns: &[
        Column::id(),
        Column::reference("post", "posts").required(),
        Column::text("content").required(),
        Column::actor("author"),
        Column::created_at("created_at"),
        Column::updated_at("updated_at"),
    ],
    search: &[SearchField::Column("content"), SearchField::Column("author")],
    ordering: &["created_at"],
    children: &[],
};

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                author TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX comments_post_idx ON comments (post);
            "#,
    }]
}
