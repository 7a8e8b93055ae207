//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → metrics exporter → signal watcher → serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop accepting → cancel status sessions → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind failure is fatal
//! - Listener binds before anything else starts

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
