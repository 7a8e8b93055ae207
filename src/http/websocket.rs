//! Status channel over WebSocket.
//!
//! # Responsibilities
//! - Validate the upgrade (origin, subprotocol) before the handshake completes
//! - Register each session and deregister it however it ends
//! - Push a liveness payload every poll interval until the session is cancelled
//! - Close with 1001 "going away" on exit
//!
//! # Data Flow
//! ```text
//! upgrade ─▶ register ─┬─▶ reader task: client close / error / shutdown ─▶ cancel
//!                      └─▶ SessionHandler: probe ─▶ send payload ─▶ wait ─▶ ...
//!                                 │ cancelled or send failed
//!                                 ▼
//!                      close 1001 ─▶ deregister
//! ```
//!
//! The session does not end when the backend becomes reachable; it keeps
//! reporting until the client disconnects or reloads.

use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

use crate::health::{Liveness, LivenessProbe};
use crate::http::payload::StatusPayload;
use crate::net::{ConnectionId, ConnectionRegistry};
use crate::observability::metrics;

/// Ways a status channel session terminates.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Writing to the socket failed.
    #[error("failed to write status message: {0}")]
    Send(#[from] axum::Error),

    /// The peer is gone.
    #[error("status channel closed by peer")]
    Closed,

    /// The session was cancelled (client close or server shutdown).
    #[error("status channel cancelled")]
    Cancelled,
}

/// Per-session context: the connection ID and a cancellation signal.
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: ConnectionId,
    cancel: watch::Receiver<bool>,
}

/// Cancels the [`SessionContext`] it was created with.
#[derive(Debug)]
pub struct SessionCanceller {
    tx: watch::Sender<bool>,
}

impl SessionContext {
    pub fn new(id: ConnectionId) -> (Self, SessionCanceller) {
        let (tx, cancel) = watch::channel(false);
        (Self { id, cancel }, SessionCanceller { tx })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once the session is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            // Canceller dropped without cancelling: never fires
            std::future::pending::<()>().await;
        }
    }
}

impl SessionCanceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Capability to push one text message to the client.
pub trait StatusSink: Send {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

impl StatusSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.send(Message::Text(text.into())).await?;
        Ok(())
    }
}

/// Drives one accepted session until it ends.
pub trait SessionHandler: Send + Sync + 'static {
    fn handle<S: StatusSink>(
        &self,
        ctx: &SessionContext,
        sink: &mut S,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Polls backend liveness and reports it to the client.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    probe: LivenessProbe,
    backend_addr: String,
    interval: Duration,
}

impl StatusChannel {
    pub fn new(probe: LivenessProbe, backend_addr: impl Into<String>, interval: Duration) -> Self {
        Self {
            probe,
            backend_addr: backend_addr.into(),
            interval,
        }
    }
}

impl SessionHandler for StatusChannel {
    async fn handle<S: StatusSink>(
        &self,
        ctx: &SessionContext,
        sink: &mut S,
    ) -> Result<(), ChannelError> {
        let mut last: Option<Liveness> = None;

        loop {
            if ctx.is_cancelled() {
                return Err(ChannelError::Cancelled);
            }

            let liveness = self.probe.check(&self.backend_addr).await;
            if last != Some(liveness) {
                match liveness {
                    Liveness::Reachable => tracing::info!(
                        connection_id = %ctx.id(),
                        backend = %self.backend_addr,
                        "Proxy destination is reachable now"
                    ),
                    Liveness::Unreachable => tracing::info!(
                        connection_id = %ctx.id(),
                        backend = %self.backend_addr,
                        "Proxy destination not reachable"
                    ),
                }
            } else if !liveness.is_reachable() {
                tracing::debug!(
                    connection_id = %ctx.id(),
                    backend = %self.backend_addr,
                    "Proxy destination liveness check failed"
                );
            }
            last = Some(liveness);

            let payload = StatusPayload::from(liveness);
            sink.send_text(payload.to_html()).await?;
            metrics::record_status_message(payload.kind());

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = ctx.cancelled() => {}
            }
        }
    }
}

/// Run an upgraded socket through `handler` as a registered session.
pub async fn run_session<H: SessionHandler>(
    handler: Arc<H>,
    registry: Arc<ConnectionRegistry>,
    mut server_stop: watch::Receiver<bool>,
    socket: WebSocket,
) {
    let guard = registry.register();
    let (ctx, canceller) = SessionContext::new(guard.id());
    let (mut sink, stream) = socket.split();

    let id = guard.id();
    let reader = tokio::spawn(async move {
        tokio::select! {
            _ = drain_client(id, stream) => {}
            _ = async { let _ = server_stop.wait_for(|stopping| *stopping).await; } => {
                tracing::debug!(connection_id = %id, "Server shutting down, cancelling session");
            }
        }
        canceller.cancel();
    });

    match handler.handle(&ctx, &mut sink).await {
        Ok(()) => {}
        Err(ChannelError::Cancelled) => {
            tracing::debug!(connection_id = %id, "Status channel cancelled");
        }
        Err(e) => {
            tracing::error!(connection_id = %id, error = %e, "Status channel terminated");
        }
    }

    let close = Message::Close(Some(CloseFrame {
        code: close_code::AWAY,
        reason: Utf8Bytes::from_static("going away"),
    }));
    let _ = sink.send(close).await;
    reader.abort();

    tracing::info!(connection_id = %id, "Client disconnected");
    drop(guard);
}

/// Read and discard client frames until it closes or errors.
async fn drain_client(id: ConnectionId, mut stream: SplitStream<WebSocket>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(frame)) => {
                tracing::debug!(connection_id = %id, frame = ?frame, "Client sent close");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Client read failed");
                return;
            }
        }
    }
}

/// Why an upgrade was refused before the handshake.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpgradeRejection {
    #[error("request Origin '{0}' is not authorized")]
    Origin(String),

    #[error("client must speak one of the subprotocols: {0}")]
    Subprotocol(String),
}

impl UpgradeRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            UpgradeRejection::Origin(_) => StatusCode::FORBIDDEN,
            UpgradeRejection::Subprotocol(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for UpgradeRejection {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Accept same-host origins, origins matching `patterns`, and requests
/// without an `Origin` header (non-browser clients).
pub fn check_origin(headers: &HeaderMap, patterns: &[String]) -> Result<(), UpgradeRejection> {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return Ok(());
    };
    let origin = origin.to_str().unwrap_or_default();

    let origin_host = Url::parse(origin).ok().and_then(|url| {
        url.host_str().map(|host| match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    });
    let Some(origin_host) = origin_host else {
        return Err(UpgradeRejection::Origin(origin.to_string()));
    };

    let request_host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if origin_host.eq_ignore_ascii_case(request_host) {
        return Ok(());
    }

    if patterns
        .iter()
        .any(|pattern| wildcard_match(pattern.as_bytes(), origin_host.as_bytes()))
    {
        return Ok(());
    }

    Err(UpgradeRejection::Origin(origin.to_string()))
}

/// Pick the first offered subprotocol we support. With no configured
/// subprotocols any client is accepted.
pub fn negotiate_subprotocol(
    headers: &HeaderMap,
    supported: &[String],
) -> Result<Option<String>, UpgradeRejection> {
    if supported.is_empty() {
        return Ok(None);
    }

    headers
        .get_all(header::SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .find(|offered| supported.iter().any(|s| s == offered))
        .map(|selected| Some(selected.to_string()))
        .ok_or_else(|| UpgradeRejection::Subprotocol(supported.join(", ")))
}

/// Case-insensitive glob match where `*` matches any run of bytes.
fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Last `*` seen and the text position it currently absorbs up to
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(c) if c.eq_ignore_ascii_case(&text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    star = Some((star_p, t));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
