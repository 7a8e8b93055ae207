//! TCP liveness probing.
//!
//! # Responsibilities
//! - Attempt one bounded-time TCP connect to the backend
//! - Release the connection immediately (no bytes exchanged)
//! - Map refusal and timeout to `Unreachable`
//!
//! Retry cadence belongs to the caller; a probe never retries.

use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

use crate::observability::metrics;

/// Reachability of the backend as observed by a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Reachable,
    Unreachable,
}

impl Liveness {
    pub fn is_reachable(self) -> bool {
        matches!(self, Liveness::Reachable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Liveness::Reachable => "reachable",
            Liveness::Unreachable => "unreachable",
        }
    }
}

/// Why a probe found the backend unreachable.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("connection timeout after {0:?}")]
    Timeout(Duration),
}

/// Timed TCP connect check.
#[derive(Debug, Clone, Copy)]
pub struct LivenessProbe {
    timeout: Duration,
}

impl LivenessProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Dial `addr` once, returning why it failed if it did.
    pub async fn probe(&self, addr: &str) -> Result<(), ProbeError> {
        match time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(ProbeError::Connect(e)),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }

    /// Dial `addr` once and classify the result.
    pub async fn check(&self, addr: &str) -> Liveness {
        let start = Instant::now();
        let liveness = match self.probe(addr).await {
            Ok(()) => Liveness::Reachable,
            Err(e) => {
                tracing::trace!(addr = %addr, error = %e, "Liveness probe failed");
                Liveness::Unreachable
            }
        };
        metrics::record_probe(liveness.as_str(), start);
        liveness
    }
}

impl Default for LivenessProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
