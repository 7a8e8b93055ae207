//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (normalize + bind, resolve self authority)
//!     → Hand listener to the HTTP layer
//!
//! Status channel upgrade
//!     → connection.rs (register session, assign ID)
//!     → session runs
//!     → guard dropped (deregister exactly once)
//! ```

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionRegistry};
pub use listener::{bind, loopback_authority, ListenerError};
