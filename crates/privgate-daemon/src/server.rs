//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use privgate_engine::{PolicyEngine, SystemClock};
use privgate_store::InMemoryPolicyStore;
use privgate_types::Taxonomy;
use std::sync::Arc;
use tokio::net::TcpListener;

/// PrivGate daemon server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Build the engine and shared state for `config`
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let taxonomy = Arc::new(Taxonomy::standard());
        let store = Arc::new(InMemoryPolicyStore::new());

        let engine = PolicyEngine::start(taxonomy, store, Arc::new(SystemClock), &config.engine)
            .await?;
        let state = AppState::new(Arc::new(engine), config.engine.clone());

        Ok(Self { config, state })
    }

    /// Shared state, as handed to the router
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(self.state.clone(), self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("PrivGate daemon listening on {}", addr);
        tracing::info!(
            "Active profile: {}",
            self.state.engine.profiles().active_profile().await
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("PrivGate daemon shutting down");

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
