use shelf_db::{Column, ColumnDefault, Migration, SearchField, TableSchema};

pub static ARTICLES: TableSchema = TableSchema {
    name: "articles",
    label: "article",
    columns: &[
        Column::id(),
        Column::varchar("title", 200).required(),
        Column::varchar("author", 100).required(),
        Column::text("content").required(),
        Column::date("publication_date").default_value(ColumnDefault::Today),
    ],
    search: &[SearchField::Column("title"), SearchField::Column("author")],
    ordering: &["title"],
    children: &[],
};

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                content TEXT NOT NULL,
                publication_date TEXT NOT NULL
            );
            "#,
    }]
}
