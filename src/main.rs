use clap::Parser;
use std::path::PathBuf;

use live_proxy::config::{parse_config, validate_config, ConfigError, ProxyConfig};
use live_proxy::lifecycle::startup;
use live_proxy::observability::logging;

/// Reverse proxy that shows a live status page until the backend is up.
#[derive(Parser, Debug)]
#[command(name = "live-proxy", version, about, long_about = None)]
struct Cli {
    /// HTTP service address [default: :8080]
    #[arg(long)]
    addr: Option<String>,

    /// Backend address to probe and forward to [default: localhost:8081]
    #[arg(long = "proxy-addr")]
    proxy_addr: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Parse the file if given, apply flag overrides, then validate once.
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => parse_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(addr) = self.addr {
            config.listener.bind_address = addr;
        }
        if let Some(proxy_addr) = self.proxy_addr {
            config.backend.address = proxy_addr;
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&Default::default());
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "live-proxy starting");

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Failed to start http-server");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("live-proxy-cli-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn flags_override_file_before_validation() {
        let path = write_temp("bad-backend.toml", "[backend]\naddress = \"localhost\"\n");
        let file = path.to_str().unwrap();

        let cli = Cli::parse_from(["live-proxy", "-c", file]);
        assert!(matches!(cli.into_config(), Err(ConfigError::Validation(_))));

        let cli = Cli::parse_from(["live-proxy", "-c", file, "--proxy-addr", "localhost:3000"]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.backend.address, "localhost:3000");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn defaults_without_flags() {
        let config = Cli::parse_from(["live-proxy"]).into_config().unwrap();
        assert_eq!(config.listener.bind_address, ":8080");
        assert_eq!(config.backend.address, "localhost:8081");
    }
}
