//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (any path not owned by the proxy)
//!     → router.rs (probe backend liveness)
//!     → Backend reachable   → backend ProxyTarget
//!     → Backend unreachable → landing ProxyTarget (path reset to index)
//!
//! Target Resolution (at startup):
//!     BackendConfig + bound listener address
//!     → target.rs
//!     → Freeze as immutable ProxyTargets
//! ```
//!
//! # Design Decisions
//! - Targets resolved at startup, immutable at runtime
//! - No cached liveness: each request re-evaluates and self-corrects

pub mod router;
pub mod target;

pub use router::{Destination, LivenessRouter, Route};
pub use target::{ProxyTarget, TargetError};
