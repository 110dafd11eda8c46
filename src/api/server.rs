use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, PRAGMA};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::dump::{read_dump, DumpResponse};
use super::error::ApiError;

const CACHE_CONTROL_VALUE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Where the server reads from and listens on
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub public_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_path: PathBuf,
}

/// Build the router: `/dump`, `/healthz`, and static files for everything else
pub fn router(db_path: PathBuf, public_dir: PathBuf) -> Router {
    let static_files = ServeDir::new(public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/dump", get(dump))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_VALUE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { db_path })
}

/// Serve until Ctrl-C
pub async fn serve(config: ServerConfig) -> Result<()> {
    if !config.db_path.is_file() {
        warn!(
            db = %config.db_path.display(),
            "database file not found; /dump fails until it is seeded"
        );
    }
    if !config.public_dir.is_dir() {
        warn!(dir = %config.public_dir.display(), "static directory not found");
    }

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, db = %config.db_path.display(), "dump API listening");

    axum::serve(listener, router(config.db_path, config.public_dir))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn dump(State(state): State<AppState>) -> Result<Json<DumpResponse>, ApiError> {
    let started = Instant::now();
    let db_path = state.db_path.clone();

    let dump = tokio::task::spawn_blocking(move || read_dump(&db_path))
        .await
        .map_err(|err| ApiError::internal(format!("dump task failed: {}", err)))?
        .map_err(|err| {
            warn!(error = %err, "dump failed");
            ApiError::from(err)
        })?;

    info!(
        associates = dump.meta.totals.associates,
        invoices = dump.meta.totals.invoices,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "served dump"
    );
    Ok(Json(dump))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}
