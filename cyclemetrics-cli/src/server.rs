//! HTTP endpoint exposing the whole-area metrics.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cyclemetrics::pipeline::analyze_files;
use cyclemetrics::{AnalysisConfig, CycleMetricsError, MetricsResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    config: Arc<AnalysisConfig>,
}

/// Query string of `GET /metrics`; missing paths fall back to the configured defaults
#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    routes_fp: Option<String>,
    buildings_fp: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("{:#}", err);
        match err.downcast_ref::<CycleMetricsError>() {
            Some(e) if e.is_not_found() => ApiError::NotFound(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub fn build_router(config: AnalysisConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state)
}

async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsResult>, ApiError> {
    let config = state.config.clone();
    let routes = config.resolve_routes_path(query.routes_fp.as_deref());
    let buildings = config.resolve_buildings_path(query.buildings_fp.as_deref());

    tracing::info!(routes = %routes.display(), buildings = %buildings.display(), "GET /metrics");

    let analysis = tokio::task::spawn_blocking(move || analyze_files(&routes, &buildings, &config))
        .await
        .map_err(|e| ApiError::Internal(format!("Analysis task failed: {}", e)))?
        .map_err(|e| {
            let err = ApiError::from(e);
            tracing::warn!(error = %err, "Metrics request failed");
            err
        })?;

    Ok(Json(analysis.metrics))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Bind `host:port` and serve until ctrl-c
pub async fn run(config: AnalysisConfig, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let router = build_router(config);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down");
}
