use anyhow::Context;
use std::sync::Arc;

use shelf_db::Migration;

use crate::module::{InitCtx, Module};

/// Module registry owning every resource module in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module. Registration order drives init, start and migrations.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Initialize modules in registration order
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect migrations from all modules.
    ///
    /// Modules are visited in registration order so that referenced tables
    /// exist before the tables pointing at them.
    pub fn collect_migrations(&self) -> Vec<(&'static str, Migration)> {
        self.modules
            .iter()
            .flat_map(|module| {
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (module.name(), migration))
            })
            .collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.journal.lock().unwrap().push(format!("init {}", self.name));
            Ok(())
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE t (id INTEGER PRIMARY KEY);",
                },
                Migration {
                    id: "002_index",
                    up: "SELECT 1;",
                },
            ]
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.journal.lock().unwrap().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    fn registry(journal: &Arc<Mutex<Vec<String>>>) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for name in ["zeta", "alpha"] {
            registry.register(Arc::new(TestModule {
                name,
                journal: journal.clone(),
            }));
        }
        registry
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn migrations_follow_registration_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&journal);
        let order: Vec<_> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, m)| format!("{module}/{}", m.id))
            .collect();
        assert_eq!(
            order,
            [
                "zeta/001_init",
                "zeta/002_index",
                "alpha/001_init",
                "alpha/002_index"
            ]
        );
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&journal);
        let settings = Settings::default();
        let db = shelf_db::Db::connect("sqlite::memory:", 1).await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        registry.init_all(&ctx).await.unwrap();
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            ["init zeta", "init alpha", "stop alpha", "stop zeta"]
        );
    }
}
