//! Request forwarding to an upstream target.
//!
//! Plain requests are streamed through the pooled client. Upgrade requests
//! (e.g. a dev server's hot-reload websocket) are forwarded with their
//! `Connection: upgrade` headers intact and, on `101 Switching Protocols`,
//! both upgraded connections are spliced together.

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Request, StatusCode, Version};
use hyper::upgrade::OnUpgrade;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};
use std::net::SocketAddr;
use std::time::Duration;

use crate::http::request::{prepare_forward_headers, request_id};
use crate::http::response;
use crate::routing::ProxyTarget;

/// Streams requests to a [`ProxyTarget`] and the response back.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// Forward `request` to `target`. Upstream failures become 502.
    pub async fn forward(
        &self,
        request: Request<Body>,
        target: &ProxyTarget,
        peer: SocketAddr,
    ) -> axum::response::Response {
        let (mut parts, body) = request.into_parts();
        let request_id = request_id(&parts.headers).to_string();

        parts.uri = match target.rewrite_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, target = %target, error = %e, "Failed to rewrite URI");
                return response::bad_gateway();
            }
        };
        parts.version = Version::HTTP_11;

        let upgrade = upgrade_protocol(&parts.headers);
        let client_upgrade = match upgrade {
            Some(_) => parts.extensions.remove::<OnUpgrade>(),
            None => None,
        };

        prepare_forward_headers(&mut parts.headers, target.authority(), peer);
        if let Some(protocol) = &upgrade {
            parts.headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
            parts.headers.insert(header::UPGRADE, protocol.clone());
        }

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            upgrade = upgrade.is_some(),
            "Forwarding request"
        );

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(mut upstream) if upstream.status() == StatusCode::SWITCHING_PROTOCOLS => {
                let Some(client_upgrade) = client_upgrade else {
                    tracing::error!(request_id = %request_id, "Upstream switched protocols without an upgrade request");
                    return response::bad_gateway();
                };
                let upstream_upgrade = hyper::upgrade::on(&mut upstream);
                tokio::spawn(tunnel(client_upgrade, upstream_upgrade, request_id));

                let (parts, body) = upstream.into_parts();
                axum::response::Response::from_parts(parts, Body::new(body))
            }
            Ok(upstream) => response::from_upstream(upstream),
            Err(e) => {
                tracing::error!(request_id = %request_id, target = %target, error = %e, "Upstream error");
                response::bad_gateway()
            }
        }
    }
}

/// The protocol requested via `Connection: upgrade` + `Upgrade`, if any.
fn upgrade_protocol(headers: &HeaderMap) -> Option<HeaderValue> {
    let wants_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    if wants_upgrade {
        headers.get(header::UPGRADE).cloned()
    } else {
        None
    }
}

/// Splice the client and upstream upgraded connections until either side closes.
async fn tunnel(client: OnUpgrade, upstream: OnUpgrade, request_id: String) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Upgrade failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);
    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((from_client, from_upstream)) => tracing::debug!(
            request_id = %request_id,
            from_client,
            from_upstream,
            "Upgraded connection closed"
        ),
        Err(e) => tracing::debug!(request_id = %request_id, error = %e, "Upgraded connection failed"),
    }
}
