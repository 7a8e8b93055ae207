//! Backend liveness subsystem.
//!
//! # Data Flow
//! ```text
//! Request router (per request)  ─┐
//!                                ├─▶ probe.rs (timed TCP connect) ─▶ Liveness
//! Status channel (per interval) ─┘
//! ```
//!
//! # Design Decisions
//! - Reachability is a TCP connect, not a protocol-level health check
//! - No cached state: every caller gets a fresh result
//! - Failures are values (`Unreachable`), never application errors

pub mod probe;

pub use probe::{Liveness, LivenessProbe, ProbeError};
