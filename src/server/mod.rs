//! HTTP surface: state creation and turns as NDJSON progress streams, plus
//! read views over committed snapshots.

pub mod api;

pub use api::{AppState, SharedState};

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::SandboxConfig;
use crate::generator::{self, TextGenerator};
use crate::guard::{AdvisoryTurnGuard, TurnGuard, spawn_sweeper};
use crate::parser::DocumentParser;
use crate::store::{MemoryStore, SnapshotStore};
use crate::turn::TurnOrchestrator;

/// Build the full application router.
pub fn build_router(state: SharedState) -> Router {
    api::api_router()
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire the application state from configuration and explicit collaborators.
pub fn app_state(
    config: &SandboxConfig,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn SnapshotStore>,
    guard: Arc<dyn TurnGuard>,
) -> Result<SharedState> {
    let schema = config.schema().context("Failed to load document schema")?;
    let orchestrator = TurnOrchestrator::new(
        Arc::new(schema),
        generator,
        store,
        config.toml.turn.clone(),
    );
    Ok(Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
        guard,
        parser: DocumentParser::default(),
        heartbeat: config.toml.stream.heartbeat_interval(),
    }))
}

/// Start the server and run until Ctrl-C.
pub async fn start_server(config: SandboxConfig) -> Result<()> {
    let generator = generator::from_config(&config)?;
    let guard: Arc<dyn TurnGuard> = Arc::new(AdvisoryTurnGuard::new());
    let state = app_state(&config, generator.clone(), Arc::new(MemoryStore::new()), guard.clone())?;

    let guard_config = &config.toml.guard;
    let sweeper = spawn_sweeper(
        guard,
        guard_config.sweep_interval(),
        guard_config.stale_after(),
    );

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        generator = generator.name(),
        dimensions = state.orchestrator.schema().len(),
        "statesandbox server listening"
    );

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");
    sweeper.abort();
    result?;

    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C; shut down by killing the process");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
