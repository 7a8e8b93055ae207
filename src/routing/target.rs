//! Upstream targets the router can forward to.
//!
//! A target is resolved once at startup and never mutated. Forwarding joins
//! the target's base path with the request path and keeps the query string.

use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::Uri;
use std::str::FromStr;
use thiserror::Error;

use crate::config::BackendConfig;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("unsupported scheme '{0}'")]
    Scheme(String),

    #[error("invalid authority '{value}': {source}")]
    Authority {
        value: String,
        #[source]
        source: InvalidUri,
    },
}

/// Immutable (scheme, authority, base path) upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
}

impl ProxyTarget {
    pub fn new(scheme: &str, authority: &str, base_path: &str) -> Result<Self, TargetError> {
        let scheme = match scheme {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(TargetError::Scheme(other.to_string())),
        };
        let authority = Authority::from_str(authority).map_err(|source| TargetError::Authority {
            value: authority.to_string(),
            source,
        })?;

        Ok(Self {
            scheme,
            authority,
            base_path: base_path.to_string(),
        })
    }

    /// Target for the real backend.
    pub fn backend(config: &BackendConfig) -> Result<Self, TargetError> {
        Self::new(&config.scheme, &config.address, "")
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Point `uri` at this target.
    pub fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(&self.base_path, uri.path());
        let path_and_query = match uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl std::fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)
    }
}

/// Join with exactly one slash between the two parts.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}
