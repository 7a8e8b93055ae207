//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Apply the configured level unless `RUST_LOG` overrides it
//! - Optionally report caller location and timestamps

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directive for a level: our crate and the HTTP middleware.
pub fn default_directive(level: &str) -> String {
    format!("live_proxy={level},tower_http={level}")
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.log_level).into());

    let layer = tracing_subscriber::fmt::layer()
        .with_file(config.show_caller)
        .with_line_number(config.show_caller)
        .with_target(!config.show_caller);

    let registry = tracing_subscriber::registry().with(filter);
    if config.show_time {
        registry.with(layer).init();
    } else {
        registry.with(layer.without_time()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_parses() {
        let directive = default_directive("info");
        assert_eq!(directive, "live_proxy=info,tower_http=info");
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
