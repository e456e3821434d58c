//! HTTP server for colloquy

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use colloquy_core::lifecycle;
use colloquy_core::AppConfig;
use colloquy_dispatch::{Gateways, Readiness, TurnOrchestrator};
use colloquy_gateways::{AssistantClient, DiscoveryClient, NluClient};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::setup;

/// Application state shared across handlers
pub struct AppState {
    pub turns: TurnOrchestrator,
}

impl AppState {
    pub fn new(turns: TurnOrchestrator) -> Self {
        Self { turns }
    }

    pub fn readiness(&self) -> &Readiness {
        self.turns.readiness()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::message_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Wire the service clients, start provisioning in the background and serve until Ctrl-C.
///
/// A failed provisioning run terminates the process with status 1.
pub async fn serve(config: AppConfig) -> Result<()> {
    let gateways = Gateways {
        dialog: Arc::new(AssistantClient::new(&config.assistant)),
        knowledge: Arc::new(DiscoveryClient::new(&config.discovery)),
        language: Arc::new(NluClient::new(&config.nlu)),
    };
    let readiness = Arc::new(Readiness::new());
    let turns = TurnOrchestrator::new(gateways.clone(), readiness.clone(), &config.dispatch);
    let state = Arc::new(AppState::new(turns));

    let addr = config.server.bind_addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    lifecycle::log_startup(&addr);

    tokio::spawn(async move {
        if !setup::run_startup(&config, &gateways, &readiness).await {
            lifecycle::log_shutdown();
            std::process::exit(1);
        }
    });

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    lifecycle::log_shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
