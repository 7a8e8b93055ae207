//! Semantic validation of a parsed configuration.
//!
//! Serde handles syntax; this pass checks values that parse fine but cannot
//! work at runtime. All failures are collected so the operator sees them at once.

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: address '{value}' must be in host:port form")]
    InvalidAddress { field: &'static str, value: String },

    #[error("backend.scheme: unsupported scheme '{0}' (only http is supported)")]
    UnsupportedScheme(String),

    #[error("{0}: must be greater than zero")]
    Zero(&'static str),

    #[error("status_channel.path_prefix: '{0}' must start with '/', not be '/' and not end with '/'")]
    InvalidPrefix(String),

    #[error("status_channel.path_prefix: '{0}' must be a literal path (no ':', '*' segments or '{{}}')")]
    PrefixNotLiteral(String),

    #[error("landing.websocket_url: '{0}' must be an absolute ws:// or wss:// URL")]
    InvalidWebsocketUrl(String),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !has_port(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if !has_port(&config.backend.address) || config.backend.address.starts_with(':') {
        errors.push(ValidationError::InvalidAddress {
            field: "backend.address",
            value: config.backend.address.clone(),
        });
    }

    if config.backend.scheme != "http" {
        errors.push(ValidationError::UnsupportedScheme(config.backend.scheme.clone()));
    }

    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::Zero("probe.timeout_ms"));
    }

    if config.status_channel.poll_interval_ms == 0 {
        errors.push(ValidationError::Zero("status_channel.poll_interval_ms"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    let prefix = &config.status_channel.path_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    } else if !is_literal_path(prefix) {
        errors.push(ValidationError::PrefixNotLiteral(prefix.clone()));
    }

    if let Some(raw) = &config.landing.websocket_url {
        let valid = Url::parse(raw)
            .map(|url| matches!(url.scheme(), "ws" | "wss") && url.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidWebsocketUrl(raw.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Route paths treat `:x`/`*x` segments and `{x}` as captures.
fn is_literal_path(path: &str) -> bool {
    !path.contains(['{', '}'])
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}

fn has_port(addr: &str) -> bool {
    addr.rsplit_once(':')
        .map(|(_, port)| port.parse::<u16>().is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.backend.address = "localhost".into();
        config.probe.timeout_ms = 0;
        config.status_channel.path_prefix = "/".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::Zero("probe.timeout_ms")));
        assert!(errors.contains(&ValidationError::InvalidPrefix("/".into())));
    }

    #[test]
    fn prefix_must_be_a_literal_path() {
        for prefix in ["/:live", "/*rest", "/{id}", "/dev/:live", "/live{"] {
            let mut config = ProxyConfig::default();
            config.status_channel.path_prefix = prefix.into();
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::PrefixNotLiteral(prefix.into())]),
                "{prefix}"
            );
        }

        let mut config = ProxyConfig::default();
        config.status_channel.path_prefix = "/dev/live:proxy".into();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn rejects_non_websocket_url() {
        let mut config = ProxyConfig::default();
        config.landing.websocket_url = Some("http://localhost:8080/_live-proxy/ws".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidWebsocketUrl(
                "http://localhost:8080/_live-proxy/ws".into()
            )])
        );

        config.landing.websocket_url = Some("wss://dev.example.com/_live-proxy/ws".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn bare_port_bind_is_allowed() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = ":9000".into();
        assert!(validate_config(&config).is_ok());

        config.backend.address = ":9001".into();
        assert!(validate_config(&config).is_err());
    }
}
