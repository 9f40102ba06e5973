//! Generic CRUD execution against SQLite, one table schema at a time.

use std::collections::HashMap;

use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::Row;

use crate::error::StoreError;
use crate::query::ListQuery;
use crate::schema::TableSchema;
use crate::sql::{self, QueryBuf};
use crate::value::{Changes, SqlValue};
use crate::Db;

/// A stored row rendered as a JSON object, children included.
pub type Record = Map<String, Value>;

/// Upper bound on ids bound into one `IN (...)` when loading children.
const CHILD_BATCH: usize = 500;

impl Db {
    /// Rows matching `query`, each with its nested children.
    pub async fn list(&self, schema: &TableSchema, query: &ListQuery) -> Result<Vec<Record>, StoreError> {
        let q = sql::select_list(schema, query);
        let mut rows = self.fetch_records(schema, &q).await?;
        self.attach_children(schema, &mut rows).await?;
        Ok(rows)
    }

    /// One row by primary key.
    pub async fn fetch(&self, schema: &TableSchema, id: i64) -> Result<Option<Record>, StoreError> {
        let mut q = sql::select_by_id(schema);
        q.params.push(SqlValue::Integer(id));
        self.fetch_one_with_children(schema, &q).await
    }

    /// Insert one row. Returns the stored row.
    pub async fn insert(&self, schema: &TableSchema, changes: &Changes) -> Result<Record, StoreError> {
        let q = sql::insert(schema, changes);
        self.fetch_one_with_children(schema, &q)
            .await?
            .ok_or(StoreError::Sqlx(sqlx::Error::RowNotFound))
    }

    /// Update one row by id. `None` when no such row exists.
    pub async fn update(
        &self,
        schema: &TableSchema,
        id: i64,
        changes: &Changes,
    ) -> Result<Option<Record>, StoreError> {
        let q = sql::update(schema, id, changes);
        self.fetch_one_with_children(schema, &q).await
    }

    /// Delete one row by id. Returns whether a row was removed.
    pub async fn delete(&self, schema: &TableSchema, id: i64) -> Result<bool, StoreError> {
        let mut q = sql::delete(schema);
        q.params.push(SqlValue::Integer(id));
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let result = bind_params(&q.sql, &q.params).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether `table` holds a row with `column = value`, ignoring `excluding`.
    pub async fn exists(
        &self,
        table: &str,
        column: &str,
        value: &SqlValue,
        excluding: Option<i64>,
    ) -> Result<bool, StoreError> {
        let q = sql::exists(table, column, value, excluding);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_params(&q.sql, &q.params).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }

    async fn fetch_one_with_children(
        &self,
        schema: &TableSchema,
        q: &QueryBuf,
    ) -> Result<Option<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_params(&q.sql, &q.params).fetch_optional(&self.pool).await?;
        let Some(row) = row else { return Ok(None) };
        let mut rows = vec![decode_row(schema, &row)?];
        self.attach_children(schema, &mut rows).await?;
        Ok(rows.pop())
    }

    async fn fetch_records(&self, schema: &TableSchema, q: &QueryBuf) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_params(&q.sql, &q.params).fetch_all(&self.pool).await?;
        rows.iter().map(|r| decode_row(schema, r)).collect()
    }

    /// Batch-load every child relation and nest it under the parent rows.
    async fn attach_children(&self, schema: &TableSchema, rows: &mut [Record]) -> Result<(), StoreError> {
        if rows.is_empty() || schema.children.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .collect();

        for relation in schema.children {
            let mut grouped: HashMap<i64, Vec<Value>> = HashMap::new();
            for chunk in ids.chunks(CHILD_BATCH) {
                let q = sql::select_by_column_in(relation.schema, relation.foreign_key, chunk);
                for child in self.fetch_records(relation.schema, &q).await? {
                    if let Some(parent) = child.get(relation.foreign_key).and_then(Value::as_i64) {
                        grouped.entry(parent).or_default().push(Value::Object(child));
                    }
                }
            }
            for row in rows.iter_mut() {
                let nested = row
                    .get("id")
                    .and_then(Value::as_i64)
                    .and_then(|id| grouped.remove(&id))
                    .unwrap_or_default();
                row.insert(relation.name.to_string(), Value::Array(nested));
            }
        }
        Ok(())
    }
}

fn bind_params<'q>(sql: &'q str, params: &'q [SqlValue]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    let mut query = sqlx::query(sql);
    for p in params {
        query = match p {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Integer(n) => query.bind(*n),
            SqlValue::Real(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

fn decode_row(schema: &TableSchema, row: &SqliteRow) -> Result<Record, StoreError> {
    let mut map = Map::new();
    for column in schema.columns {
        let value = if column.kind.is_integral() {
            row.try_get::<Option<i64>, _>(column.name)?
                .map(Value::from)
                .unwrap_or(Value::Null)
        } else {
            row.try_get::<Option<String>, _>(column.name)?
                .map(Value::String)
                .unwrap_or(Value::Null)
        };
        map.insert(column.name.to_string(), value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::{self, Migration};
    use crate::query::{Lookup, OrderBy};
    use crate::schema::fixtures::{AUTHORS, BOOKS, DDL};

    async fn seeded() -> Db {
        let db = Db::connect("sqlite::memory:", 1).await.unwrap();
        migrate::apply(&db, "fixtures", &[Migration { id: "001", up: DDL }])
            .await
            .unwrap();

        let herbert = db
            .insert(&AUTHORS, &Changes::new().with("name", "Frank Herbert"))
            .await
            .unwrap();
        let austen = db
            .insert(&AUTHORS, &Changes::new().with("name", "Jane Austen"))
            .await
            .unwrap();
        let herbert = herbert["id"].as_i64().unwrap();
        let austen = austen["id"].as_i64().unwrap();

        for (title, author, year, price) in [
            ("Dune", herbert, 1965_i64, "9.99"),
            ("Emma", austen, 1815, "24.50"),
            ("Persuasion", austen, 1817, "12.00"),
        ] {
            db.insert(
                &BOOKS,
                &Changes::new()
                    .with("title", title)
                    .with("author", author)
                    .with("publication_year", year)
                    .with("price", price),
            )
            .await
            .unwrap();
        }
        db
    }

    fn titles(rows: &[Record]) -> Vec<&str> {
        rows.iter().filter_map(|r| r["title"].as_str()).collect()
    }

    #[tokio::test]
    async fn insert_returns_stored_row_with_generated_id() {
        let db = seeded().await;
        let rows = db.list(&BOOKS, &ListQuery::new()).await.unwrap();
        assert_eq!(rows.len(), 3);
        let dune = &rows[0];
        assert_eq!(dune["id"], Value::from(1));
        assert_eq!(dune["price"], Value::from("9.99"));
        assert_eq!(dune["isbn"], Value::Null);
    }

    #[tokio::test]
    async fn numeric_filters_and_ordering_use_decimal_values() {
        let db = seeded().await;
        let query = ListQuery::new()
            .filter("price", Lookup::Gte, SqlValue::Real(10.0))
            .order_by(OrderBy::desc("price"));
        let rows = db.list(&BOOKS, &query).await.unwrap();
        assert_eq!(titles(&rows), ["Emma", "Persuasion"]);
    }

    #[tokio::test]
    async fn search_reaches_related_author_name() {
        let db = seeded().await;
        let query = ListQuery::new().search("AUSTEN").order_by(OrderBy::asc("title"));
        let rows = db.list(&BOOKS, &query).await.unwrap();
        assert_eq!(titles(&rows), ["Emma", "Persuasion"]);
    }

    #[tokio::test]
    async fn children_are_nested_under_parents() {
        let db = seeded().await;
        let austen = db.fetch(&AUTHORS, 2).await.unwrap().unwrap();
        let books = austen["books"].as_array().unwrap();
        let nested: Vec<_> = books.iter().filter_map(|b| b["title"].as_str()).collect();
        assert_eq!(nested, ["Emma", "Persuasion"]);
    }

    #[tokio::test]
    async fn delete_cascades_and_reports_missing_rows() {
        let db = seeded().await;
        assert!(db.delete(&AUTHORS, 2).await.unwrap());
        assert!(!db.delete(&AUTHORS, 2).await.unwrap());
        let rows = db.list(&BOOKS, &ListQuery::new()).await.unwrap();
        assert_eq!(titles(&rows), ["Dune"]);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_none() {
        let db = seeded().await;
        let changes = Changes::new().with("title", "Dune Messiah");
        assert!(db.update(&BOOKS, 99, &changes).await.unwrap().is_none());
        let updated = db.update(&BOOKS, 1, &changes).await.unwrap().unwrap();
        assert_eq!(updated["title"], Value::from("Dune Messiah"));
    }

    #[tokio::test]
    async fn unique_and_foreign_key_violations_are_classified() {
        let db = seeded().await;
        let book = |isbn: &str, author: i64| {
            Changes::new()
                .with("title", "Sequel")
                .with("author", author)
                .with("publication_year", 1969_i64)
                .with("isbn", isbn)
                .with("price", "5.00")
        };
        db.insert(&BOOKS, &book("9780441013593", 1)).await.unwrap();
        assert!(matches!(
            db.insert(&BOOKS, &book("9780441013593", 1)).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            db.insert(&BOOKS, &book("9780441013594", 42)).await,
            Err(StoreError::ForeignKey(_))
        ));
        assert!(db
            .exists("books", "isbn", &SqlValue::from("9780441013593"), None)
            .await
            .unwrap());
        assert!(!db
            .exists("books", "isbn", &SqlValue::from("9780441013593"), Some(4))
            .await
            .unwrap());
    }
}
