//! Application bootstrap shared by the `shelf-app` and `shelf` binaries.

use anyhow::Context;
use shelf_db::{migrate, Db};
use shelf_kernel::{settings::Settings, AppContext, InitCtx, ModuleRegistry};

use crate::modules;

/// Registry holding every resource module.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Apply pending migrations of every module. Returns how many ran.
pub async fn migrate(registry: &ModuleRegistry, db: &Db) -> anyhow::Result<usize> {
    let mut applied = 0;
    for (module, migration) in registry.collect_migrations() {
        applied += migrate::apply(db, module, std::slice::from_ref(&migration))
            .await
            .with_context(|| format!("failed to migrate module '{}'", module))?;
    }
    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

pub async fn connect(settings: &Settings) -> anyhow::Result<Db> {
    Db::connect(&settings.database.url, settings.database.max_connections).await
}

/// Connect, migrate when enabled, then init and start every module.
pub async fn bootstrap(settings: Settings) -> anyhow::Result<(ModuleRegistry, AppContext)> {
    let registry = registry();
    let db = connect(&settings).await?;

    if settings.database.run_migrations {
        migrate(&registry, &db).await?;
    }

    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!(
        env = ?settings.environment,
        modules = registry.len(),
        tokens = settings.auth.tokens.len(),
        "shelf bootstrap complete"
    );
    Ok((registry, AppContext::new(settings, db)))
}

/// Serve until a shutdown signal, then stop modules and close the pool.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (registry, ctx) = bootstrap(settings).await?;

    let served = shelf_http::start_server(&registry, &ctx).await;

    registry.stop_all().await?;
    ctx.db.close().await;
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> Settings {
        let mut settings = Settings::default();
        settings.database.url = "sqlite::memory:".to_string();
        settings
    }

    #[tokio::test]
    async fn bootstrap_migrates_every_module_once() {
        let (registry, ctx) = bootstrap(memory_settings()).await.unwrap();
        assert_eq!(registry.len(), 5);

        let ledger = migrate::applied(&ctx.db).await.unwrap();
        let modules: Vec<_> = ledger.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(
            modules,
            ["authors", "books", "books", "articles", "posts", "comments"]
        );

        assert_eq!(migrate(&registry, &ctx.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn migrations_can_be_skipped() {
        let mut settings = memory_settings();
        settings.database.run_migrations = false;
        let (_, ctx) = bootstrap(settings).await.unwrap();
        assert!(migrate::applied(&ctx.db).await.unwrap().is_empty());
    }
}
