use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;
use user_preferences::UserPreferencesModule;
use user_preferences::api::rest::openapi::{OpenApiInfo, OpenApiRegistry};

use crate::config::{AppConfig, DatabaseConfig};

pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    if config.is_in_memory() {
        // every pooled connection would otherwise see its own empty database
        options.max_connections(1).min_connections(1);
    } else {
        options.max_connections(config.max_connections);
    }
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .context("failed to connect to the database")
}

/// Migrates, initializes and mounts the preferences module.
pub async fn build_router(config: &AppConfig, db: DatabaseConnection) -> Result<Router> {
    let module = UserPreferencesModule::new();
    module.migrate(&db).await?;
    module.init(db, &config.modules.user_preferences.config)?;

    let openapi = OpenApiRegistry::new();
    let router = module.register_rest(Router::new(), &openapi)?;

    let doc = Arc::new(openapi.build_openapi(&OpenApiInfo::default()));
    let router = router
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(
            "/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move {
                    ([(header::CACHE_CONTROL, "no-store")], Json(doc.as_ref()))
                        .into_response()
                }
            }),
        );

    Ok(with_trace_layer(router))
}

fn with_trace_layer(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    status = Empty,
                    latency_ms = Empty
                )
            })
            .on_response(
                |res: &axum::http::Response<axum::body::Body>,
                 latency: Duration,
                 span: &tracing::Span| {
                    span.record("status", res.status().as_u16());
                    span.record("latency_ms", latency.as_millis());
                },
            ),
    )
}

pub async fn run(config: AppConfig) -> Result<()> {
    let addr = config.socket_addr()?;
    let db = connect(&config.database).await?;
    let router = build_router(&config, db).await?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
