//! Live development proxy.
//!
//! Forwards traffic to a backend that may not be listening yet. While the
//! backend is down, requests get a landing page whose status channel reports
//! backend liveness every poll interval.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!   Client ──────▶│ http::server ──▶ routing::LivenessRouter ──┬─────────┼──▶ Backend
//!                 │        │               │ health::probe     │         │
//!                 │        │               ▼                   │         │
//!                 │        │        landing target (self) ◀────┘         │
//!                 │        ▼                                             │
//!                 │ http::websocket (status channel) ── net::connection  │
//!                 └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
