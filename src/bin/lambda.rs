//! AWS Lambda entry point for Status Relay
//!
//! Deploy with `cargo lambda build --release --features lambda` and invoke
//! from an EventBridge schedule. Configuration comes from the environment;
//! the dedup set lives in S3 (`S3_BUCKET`, `S3_PREFIX`).

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::{error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use status_relay::error::Result;
use status_relay::models::{Config, RunReport, StorageBackend};
use status_relay::pipeline::run_relay;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> std::result::Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Status Relay Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}

/// Handler for AWS Lambda events. One invocation is one tick.
#[instrument(skip(event))]
async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Received event: {:?}", event.payload);

    match run_lambda_tick().await {
        Ok(RunReport::Skipped { reason }) => {
            info!("Run skipped: {}", reason);
            Ok(serde_json::json!({ "status": "skipped", "reason": reason }))
        }
        Ok(report) => {
            let deliveries = report.into_deliveries();
            let failed = deliveries.iter().filter(|d| d.is_failed()).count();
            info!(
                "Lambda execution successful: {} deliveries, {} failed",
                deliveries.len(),
                failed
            );
            Ok(serde_json::json!({
                "status": "success",
                "deliveries": deliveries,
                "failed": failed
            }))
        }
        Err(e) => {
            error!("Lambda execution failed: {}", e);
            Ok(serde_json::json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

async fn run_lambda_tick() -> Result<RunReport> {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::S3;
    config.apply_env()?;
    config.validate()?;

    run_relay(Arc::new(config)).await
}
