//! Response handling and transformation.
//!
//! # Responsibilities
//! - Convert the upstream response into an axum response, streaming the body
//! - Strip hop-by-hop headers from the upstream response
//! - Map upstream failures to 502 Bad Gateway

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

use crate::http::request::strip_hop_by_hop;

/// Convert an upstream response for the client without buffering the body.
pub fn from_upstream(response: Response<Incoming>) -> axum::response::Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Response sent when the upstream could not be reached or failed mid-request.
pub fn bad_gateway() -> axum::response::Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}
