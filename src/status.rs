// src/status.rs
//! Optional read-only HTTP endpoint for supervisors and scrapers.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::dedup::DedupStore;

#[derive(Clone)]
pub struct StatusState {
    pub store: Arc<dyn DedupStore>,
    pub poll_interval_secs: u64,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Serialize)]
struct StatusResp {
    last_posted: Option<String>,
    poll_interval_secs: u64,
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn status(State(state): State<StatusState>) -> Json<StatusResp> {
    Json(StatusResp {
        last_posted: state.store.last_posted().await,
        poll_interval_secs: state.poll_interval_secs,
    })
}

async fn metrics(State(state): State<StatusState>) -> Response {
    match &state.metrics {
        Some(h) => h.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

pub async fn serve(addr: SocketAddr, state: StatusState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding status server on {addr}"))?;
    tracing::info!(%addr, "status server listening");
    axum::serve(listener, router(state))
        .await
        .context("status server")?;
    Ok(())
}

/// Run the status server in the background; failures are logged.
pub fn spawn(addr: SocketAddr, state: StatusState) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(addr, state).await {
            tracing::warn!(error = %format!("{e:#}"), "status server stopped");
        }
    })
}
