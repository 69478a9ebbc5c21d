// src/server.rs

//! Liveness endpoint and optional manual trigger.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;

use crate::error::Result;
use crate::models::ServerConfig;
use crate::scheduler::RelayRunner;

const LIVENESS_TEXT: &str = "status-relay is running";

/// Build the HTTP router. The trigger route exists only when enabled.
pub fn create_router(runner: Arc<RelayRunner>, config: &ServerConfig) -> Router {
    let router = Router::new().route("/", get(liveness));

    let router = if config.manual_trigger {
        router.route(&config.trigger_path, get(trigger))
    } else {
        router
    };

    router.with_state(runner)
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

/// Run one tick and answer with its delivery reports.
async fn trigger(State(runner): State<Arc<RelayRunner>>) -> Response {
    log::info!("Manual trigger received");

    match runner.try_run().await {
        Some(Ok(report)) => Json(report.into_deliveries()).into_response(),
        Some(Err(e)) => {
            log::error!("Manual run failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        None => (StatusCode::CONFLICT, "a run is already in progress").into_response(),
    }
}

/// Bind and serve until Ctrl-C.
pub async fn serve(runner: Arc<RelayRunner>, config: &ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    if config.manual_trigger {
        log::info!("Manual trigger enabled at {}", config.trigger_path);
    }

    axum::serve(listener, create_router(runner, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
