//! Application builder and server runner.

use std::sync::Arc;

use axum::Router;

use modelhub_converter::{RequestOrchestrator, TokioProcessRunner};
use modelhub_core::config::AppConfig;
use modelhub_core::AppResult;
use modelhub_core::error::AppError;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the ModelHub server with the given configuration.
pub async fn run_server(mut config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting ModelHub server...");

    // ── Step 1: Anchor paths and create upload directory ─────────
    // The converter runs inside per-job directories, so relative paths
    // from the config would no longer resolve once it starts.
    config.converter.absolutize_paths().map_err(|e| {
        AppError::internal(format!("Failed to resolve converter paths: {}", e))
    })?;

    let upload_dir = &config.converter.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        AppError::internal(format!(
            "Failed to create upload dir '{}': {}",
            upload_dir.display(),
            e
        ))
    })?;

    // ── Step 2: Conversion pipeline ──────────────────────────────
    let process = Arc::new(TokioProcessRunner::new(config.converter.max_diagnostic_bytes));
    let orchestrator = RequestOrchestrator::from_config(&config.converter, process);

    tracing::info!(
        converter = %orchestrator.runner().executable().display(),
        upload_dir = %upload_dir.display(),
        default_output = orchestrator.default_output().extension,
        max_concurrent = config.converter.max_concurrent_conversions,
        "Conversion pipeline ready"
    );

    // ── Step 3: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_app(AppState::new(config, orchestrator));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("ModelHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("ModelHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
