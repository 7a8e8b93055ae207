//! Startup orchestration.
//!
//! Bind first (failure is fatal), then start the optional metrics exporter
//! and the signal watcher, then serve until shutdown.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::ProxyConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::net::{self, ListenerError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Run the proxy until a termination signal arrives.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    tracing::info!(
        addr = %config.listener.bind_address,
        backend = %config.backend.address,
        "Starting http-server"
    );

    let listener = net::bind(&config.listener.bind_address).await?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        }
    });

    HttpServer::new(config).run(listener, server_shutdown).await?;
    Ok(())
}
