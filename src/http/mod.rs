//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → /healthy                  → 200
//!     → {prefix}/ws               → websocket.rs (status channel session)
//!     → {prefix}/                 → landing.rs (render page)
//!     → anything else             → routing (probe backend)
//!                                 → proxy.rs (forward to backend or landing)
//!                                 → response.rs (stream back, 502 on failure)
//! ```

pub mod landing;
pub mod payload;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
