//! Request handling and transformation.
//!
//! # Responsibilities
//! - Read the request ID set by the request-id layer
//! - Prepare request headers for forwarding (hop-by-hop, Host, X-Forwarded-For)

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::uri::Authority;
use std::net::SocketAddr;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header listing client addresses seen by proxies.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Request ID of a request, or "unknown" if the layer did not set one.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Rewrite inbound headers for the upstream hop.
pub fn prepare_forward_headers(headers: &mut HeaderMap, authority: &Authority, peer: SocketAddr) {
    strip_hop_by_hop(headers);

    if let Ok(host) = HeaderValue::from_str(authority.as_str()) {
        headers.insert(header::HOST, host);
    }

    let client_ip = peer.ip().to_string();
    let forwarded = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{prior}, {client_ip}"),
        None => client_ip,
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
