//! SQLite pool, schema-driven CRUD store and migration tooling for Shelf.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod error;
pub mod migrate;
pub mod query;
pub mod schema;
pub mod sql;
pub mod store;
pub mod value;

pub use error::StoreError;
pub use migrate::Migration;
pub use query::{Filter, ListQuery, Lookup, OrderBy};
pub use schema::{Column, ColumnDefault, ColumnKind, Relation, SearchField, Source, TableSchema};
pub use store::Record;
pub use value::{Changes, SqlValue};

/// Shared handle to the connection pool.
#[derive(Clone, Debug)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open a pool for `url`, creating the database file when missing.
    ///
    /// In-memory databases live as long as their connection, so they get a
    /// single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{}'", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to '{}'", url))?;

        tracing::info!(target: "shelf-db", url, in_memory, "database pool ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial statement, used by readiness checks.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_answers_ping() {
        let db = Db::connect("sqlite::memory:", 8).await.unwrap();
        db.ping().await.unwrap();
    }
}
