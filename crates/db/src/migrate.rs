//! Per-module schema migrations tracked in a ledger table.

use anyhow::Context;

use crate::Db;

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS "_shelf_migrations" (
        module TEXT NOT NULL,
        id TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Migration definition contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

async fn ensure_ledger(db: &Db) -> anyhow::Result<()> {
    sqlx::query(LEDGER_DDL)
        .execute(db.pool())
        .await
        .context("failed to create migration ledger")?;
    Ok(())
}

/// Apply the migrations of `module` that are not yet in the ledger, in the
/// order given. Each migration runs in its own transaction. Returns how many
/// were applied.
pub async fn apply(db: &Db, module: &str, migrations: &[Migration]) -> anyhow::Result<usize> {
    ensure_ledger(db).await?;

    let mut applied = 0;
    for migration in migrations {
        let done = sqlx::query(r#"SELECT 1 FROM "_shelf_migrations" WHERE module = ? AND id = ?"#)
            .bind(module)
            .bind(migration.id)
            .fetch_optional(db.pool())
            .await
            .context("failed to read migration ledger")?
            .is_some();
        if done {
            tracing::debug!(target: "shelf-db", module, migration = migration.id, "migration already applied");
            continue;
        }

        let mut tx = db.pool().begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;
        sqlx::query(r#"INSERT INTO "_shelf_migrations" (module, id) VALUES (?, ?)"#)
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "shelf-db", module, migration = migration.id, "migration applied");
        applied += 1;
    }
    Ok(applied)
}

/// `(module, id)` pairs recorded in the ledger, oldest first.
pub async fn applied(db: &Db) -> anyhow::Result<Vec<(String, String)>> {
    ensure_ledger(db).await?;
    let rows: Vec<(String, String)> =
        sqlx::query_as(r#"SELECT module, id FROM "_shelf_migrations" ORDER BY rowid"#)
            .fetch_all(db.pool())
            .await
            .context("failed to read migration ledger")?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIGRATIONS: &[Migration] = &[
        Migration {
            id: "001_init",
            up: "CREATE TABLE shelves (id INTEGER PRIMARY KEY, label TEXT NOT NULL);",
        },
        Migration {
            id: "002_seed",
            up: "INSERT INTO shelves (label) VALUES ('fiction'); INSERT INTO shelves (label) VALUES ('poetry');",
        },
    ];

    #[tokio::test]
    async fn applies_each_migration_once() {
        let db = Db::connect("sqlite::memory:", 1).await.unwrap();

        assert_eq!(apply(&db, "shelves", MIGRATIONS).await.unwrap(), 2);
        assert_eq!(apply(&db, "shelves", MIGRATIONS).await.unwrap(), 0);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shelves")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 2);

        let ledger = applied(&db).await.unwrap();
        assert_eq!(
            ledger,
            vec![
                ("shelves".to_string(), "001_init".to_string()),
                ("shelves".to_string(), "002_seed".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Db::connect("sqlite::memory:", 1).await.unwrap();
        let broken = [Migration {
            id: "001_broken",
            up: "CREATE TABLE oops (;",
        }];

        assert!(apply(&db, "broken", &broken).await.is_err());
        assert!(applied(&db).await.unwrap().is_empty());
    }
}
