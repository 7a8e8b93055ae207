//! Liveness-driven request routing.
//!
//! Every request re-probes the backend (no cached result) and goes to the
//! backend when it accepts connections, otherwise to the landing page. The
//! check and the forward are not atomic; a request racing a backend restart
//! may see an upstream error, and the next request re-evaluates.

use axum::http::uri::PathAndQuery;
use axum::http::Uri;

use crate::health::{Liveness, LivenessProbe};
use crate::routing::target::ProxyTarget;

/// Where a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Backend,
    Landing,
}

impl Destination {
    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Backend => "backend",
            Destination::Landing => "landing",
        }
    }
}

/// A routing decision.
#[derive(Debug, Clone, Copy)]
pub struct Route<'a> {
    pub destination: Destination,
    pub target: &'a ProxyTarget,
}

/// Chooses between the backend and the landing page per request.
#[derive(Debug)]
pub struct LivenessRouter {
    probe: LivenessProbe,
    backend_addr: String,
    backend: ProxyTarget,
    landing: ProxyTarget,
}

impl LivenessRouter {
    pub fn new(
        probe: LivenessProbe,
        backend_addr: impl Into<String>,
        backend: ProxyTarget,
        landing: ProxyTarget,
    ) -> Self {
        Self {
            probe,
            backend_addr: backend_addr.into(),
            backend,
            landing,
        }
    }

    pub fn backend(&self) -> &ProxyTarget {
        &self.backend
    }

    pub fn landing(&self) -> &ProxyTarget {
        &self.landing
    }

    /// Probe the backend and pick a destination.
    pub async fn route(&self) -> Route<'_> {
        match self.probe.check(&self.backend_addr).await {
            Liveness::Reachable => Route {
                destination: Destination::Backend,
                target: &self.backend,
            },
            Liveness::Unreachable => Route {
                destination: Destination::Landing,
                target: &self.landing,
            },
        }
    }
}

/// Rewrite a request URI to the landing page index, keeping the query.
pub fn landing_index_uri(uri: &Uri) -> Uri {
    let path_and_query = match uri.query() {
        Some(query) => format!("/?{query}"),
        None => "/".to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = PathAndQuery::try_from(path_and_query).ok();
    Uri::from_parts(parts).unwrap_or_else(|_| Uri::from_static("/"))
}
