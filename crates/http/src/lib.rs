//! HTTP server facade for Shelf with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router, ServiceExt,
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use shelf_db::Db;
use shelf_kernel::{AppContext, ModuleRegistry};

pub mod auth;
pub mod error;
pub mod guard;
pub mod router;

pub use auth::Actor;
pub use error::{AppError, FieldError, FieldErrors};
pub use guard::authorize;

use router::RouterBuilder;

/// The assembled application service. Trailing slashes are trimmed before
/// routing, so `/api/books/` and `/api/books` reach the same handler.
pub type App = NormalizePath<Router>;

/// Start the HTTP server and run until Ctrl-C or SIGTERM
pub async fn start_server(registry: &ModuleRegistry, ctx: &AppContext) -> anyhow::Result<()> {
    let settings = &ctx.settings;
    tracing::info!(
        "starting HTTP server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    let app = build_app(registry, ctx);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}",
        listener.local_addr().context("listener has no local address")?
    );

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the full application: module routes, docs, health probes and
/// global middlewares.
pub fn build_app(registry: &ModuleRegistry, ctx: &AppContext) -> App {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(registry, ctx))
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, ctx: &AppContext) -> Router {
    let db = ctx.db.clone();

    RouterBuilder::new()
        .route("/healthz", get(health_check))
        .route("/readyz", get(move || readiness_check(db.clone())))
        .mount_modules(registry, ctx)
        .with_openapi(registry)
        .with_fallback()
        .with_timeout(ctx.settings.server.request_timeout_ms)
        .with_cors()
        .with_tracing()
        .with_request_id()
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Readiness: the store must answer a trivial query
async fn readiness_check(db: Db) -> Response {
    match db.ping().await {
        Ok(()) => "ok".into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use shelf_kernel::settings::Settings;
    use tower::{Service, ServiceExt};

    async fn app() -> App {
        let settings = Settings::default();
        let db = Db::connect("sqlite::memory:", 1).await.unwrap();
        let ctx = AppContext::new(settings, db);
        build_app(&ModuleRegistry::new(), &ctx)
    }

    async fn get(app: &mut App, uri: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = ServiceExt::<Request>::ready(app)
            .await
            .unwrap()
            .call(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_and_readiness_probes() {
        let mut app = app().await;
        assert_eq!(get(&mut app, "/healthz").await, (StatusCode::OK, "ok".to_string()));
        assert_eq!(get(&mut app, "/readyz/").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn readiness_fails_once_the_pool_is_closed() {
        let settings = Settings::default();
        let db = Db::connect("sqlite::memory:", 1).await.unwrap();
        let ctx = AppContext::new(settings, db.clone());
        let mut app = build_app(&ModuleRegistry::new(), &ctx);
        db.close().await;
        let (status, _) = get(&mut app, "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let mut app = app().await;
        let (status, body) = get(&mut app, "/docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(doc["info"]["title"], "Shelf API");
    }

    #[tokio::test]
    async fn unknown_paths_use_the_error_envelope() {
        let mut app = app().await;
        let (status, body) = get(&mut app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(doc["error"]["code"], "not_found");
    }
}
