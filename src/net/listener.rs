//! TCP listener setup.
//!
//! # Responsibilities
//! - Normalize `:port` bind addresses to all interfaces
//! - Bind the proxy's own listener (failure is fatal at startup)
//! - Resolve the loopback authority the proxy uses to reach itself

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured address is not usable.
    #[error("Invalid bind address '{0}'")]
    Address(String),
    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Expand a bare `:port` into an all-interfaces address.
pub fn normalize_bind_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Bind the proxy listener.
pub async fn bind(addr: &str) -> Result<TcpListener, ListenerError> {
    let normalized = normalize_bind_address(addr);
    if normalized.is_empty() {
        return Err(ListenerError::Address(addr.to_string()));
    }

    let listener = TcpListener::bind(&normalized)
        .await
        .map_err(|source| ListenerError::Bind {
            addr: normalized.clone(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}

/// Authority (`host:port`) that reaches a listener bound at `local_addr`
/// from the same host. Wildcard binds are reached through loopback.
pub fn loopback_authority(local_addr: SocketAddr) -> String {
    let ip = match local_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local_addr.port()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_port_binds_all_interfaces() {
        assert_eq!(normalize_bind_address(":8080"), "0.0.0.0:8080");
        assert_eq!(normalize_bind_address("127.0.0.1:8080"), "127.0.0.1:8080");
    }

    #[test]
    fn wildcard_is_reached_via_loopback() {
        let v4: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(loopback_authority(v4), "127.0.0.1:8080");

        let v6: SocketAddr = "[::]:8080".parse().unwrap();
        assert_eq!(loopback_authority(v6), "[::1]:8080");

        let specific: SocketAddr = "192.168.1.10:9000".parse().unwrap();
        assert_eq!(loopback_authority(specific), "192.168.1.10:9000");
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let first = bind("127.0.0.1:0").await.unwrap();
        let addr = first.local_addr().unwrap().to_string();

        let err = bind(&addr).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
        assert!(err.to_string().contains(&addr));
    }
}
