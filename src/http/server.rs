//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout)
//! - Serve the proxy's own routes (health, landing page, status channel)
//! - Dispatch everything else through the liveness router
//! - Cancel live status channel sessions on shutdown

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, StatusChannelConfig};
use crate::health::LivenessProbe;
use crate::http::landing::{LandingPage, WebsocketEndpoint};
use crate::http::proxy::Forwarder;
use crate::http::request::request_id;
use crate::http::websocket::{self, StatusChannel};
use crate::net::{loopback_authority, ConnectionRegistry};
use crate::observability::metrics;
use crate::routing::router::landing_index_uri;
use crate::routing::{Destination, LivenessRouter, ProxyTarget, TargetError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid proxy target: {0}")]
    Target(#[from] TargetError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<LivenessRouter>,
    pub forwarder: Forwarder,
    pub status_channel: Arc<StatusChannel>,
    pub status_config: Arc<StatusChannelConfig>,
    pub registry: Arc<ConnectionRegistry>,
    pub landing: Arc<LandingPage>,
    pub server_stop: watch::Receiver<bool>,
}

/// HTTP server for the live proxy.
pub struct HttpServer {
    config: ProxyConfig,
    registry: Arc<ConnectionRegistry>,
    stop_tx: watch::Sender<bool>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            stop_tx,
        }
    }

    /// Registry of open status channel sessions.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Build the Axum router for a listener bound at `local_addr`.
    ///
    /// The landing page target points back at this listener.
    #[allow(deprecated)]
    pub fn build_router(&self, local_addr: SocketAddr) -> Result<Router, ServerError> {
        let config = &self.config;
        let status = &config.status_channel;
        let probe = LivenessProbe::new(config.probe.timeout());

        let backend = ProxyTarget::backend(&config.backend)?;
        let landing_target = ProxyTarget::new(
            "http",
            &loopback_authority(local_addr),
            &status.path_prefix,
        )?;
        tracing::info!(backend = %backend, landing = %landing_target, "Proxy targets resolved");

        let endpoint = match &config.landing.websocket_url {
            Some(url) => WebsocketEndpoint::Url(url.clone()),
            None => WebsocketEndpoint::Path(status.websocket_path()),
        };

        let state = AppState {
            router: Arc::new(LivenessRouter::new(
                probe,
                config.backend.address.clone(),
                backend,
                landing_target,
            )),
            forwarder: Forwarder::new(config.probe.timeout()),
            status_channel: Arc::new(StatusChannel::new(
                probe,
                config.backend.address.clone(),
                status.poll_interval(),
            )),
            status_config: Arc::new(status.clone()),
            registry: Arc::clone(&self.registry),
            landing: Arc::new(LandingPage {
                title: config.landing.title.clone(),
                endpoint,
                landing_path: status.landing_path(),
            }),
            server_stop: self.stop_tx.subscribe(),
        };

        Ok(Router::new()
            .route("/healthy", get(healthy))
            .route(&status.websocket_path(), get(status_channel_handler))
            .route(&status.landing_path(), any(landing_page))
            .route("/", any(route_request))
            .fallback(route_request)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            ))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        let app = self.build_router(addr)?;

        tracing::info!(
            address = %addr,
            backend = %self.config.backend.address,
            "HTTP server starting"
        );

        let stop_tx = self.stop_tx;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            stop_tx.send_replace(true);
        })
        .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness of the proxy process itself.
async fn healthy() -> StatusCode {
    StatusCode::OK
}

async fn landing_page(State(state): State<AppState>) -> Response {
    match state.landing.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render landing page");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn status_channel_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(rejection) = websocket::check_origin(&headers, &state.status_config.origin_patterns) {
        tracing::debug!(error = %rejection, "Rejected status channel upgrade");
        return rejection.into_response();
    }

    let ws = match websocket::negotiate_subprotocol(&headers, &state.status_config.subprotocols) {
        Ok(Some(protocol)) => ws.protocols([protocol]),
        Ok(None) => ws,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected status channel upgrade");
            return rejection.into_response();
        }
    };

    let handler = Arc::clone(&state.status_channel);
    let registry = Arc::clone(&state.registry);
    let server_stop = state.server_stop.clone();

    ws.on_failed_upgrade(|e| tracing::debug!(error = %e, "While accepting websocket connection"))
        .on_upgrade(move |socket| websocket::run_session(handler, registry, server_stop, socket))
}

/// Probe the backend and forward to it or to the landing page.
async fn route_request(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let route = state.router.route().await;

    if route.destination == Destination::Landing {
        let uri = landing_index_uri(request.uri());
        *request.uri_mut() = uri;
    }

    tracing::debug!(
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path(),
        destination = route.destination.as_str(),
        "Routing request"
    );

    let response = state.forwarder.forward(request, route.target, peer).await;
    metrics::record_route(route.destination.as_str(), response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validate_config;

    #[test]
    fn validated_prefixes_build_a_router() {
        let local_addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();

        for prefix in ["/_live-proxy", "/dev/live", "/dev/live:proxy", "/a.b-c_d"] {
            let mut config = ProxyConfig::default();
            config.status_channel.path_prefix = prefix.into();
            assert_eq!(validate_config(&config), Ok(()), "{prefix}");

            HttpServer::new(config).build_router(local_addr).unwrap();
        }
    }
}
