use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use shelf_kernel::{AppContext, InitCtx, Migration, Module};

use super::{controller, openapi, Resource};

/// Adapts a [`Resource`] to the kernel module lifecycle.
pub struct ResourceModule<R> {
    resource: Arc<R>,
}

impl<R: Resource> ResourceModule<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource: Arc::new(resource),
        }
    }

    /// Boxed for registration.
    pub fn shared(resource: R) -> Arc<dyn Module> {
        Arc::new(Self::new(resource))
    }
}

#[async_trait]
impl<R: Resource> Module for ResourceModule<R> {
    fn name(&self) -> &'static str {
        self.resource.schema().name
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "resource module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &AppContext) -> Router {
        controller::router(self.resource.clone(), ctx)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::fragment(
            self.resource.schema(),
            &self.resource.policy(),
        ))
    }

    fn migrations(&self) -> Vec<Migration> {
        self.resource.migrations()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "resource module stopped");
        Ok(())
    }
}
