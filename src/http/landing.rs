//! Landing page rendering.
//!
//! The page opens the status channel and swaps the status elements in place
//! as payloads arrive. It reloads itself once the backend is reachable,
//! unless it was opened directly at the landing path.

use thiserror::Error;
use url::Url;

const TEMPLATE: &str = include_str!("../../templates/index.html");

/// Where the landing page connects for status updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebsocketEndpoint {
    /// Path relative to the page's origin.
    Path(String),
    /// Absolute `ws://` or `wss://` URL.
    Url(String),
}

impl WebsocketEndpoint {
    fn resolve(&self) -> Result<String, RenderError> {
        match self {
            WebsocketEndpoint::Path(path) => Ok(path.clone()),
            WebsocketEndpoint::Url(raw) => {
                let url = Url::parse(raw).map_err(|_| RenderError::Endpoint(raw.clone()))?;
                if !matches!(url.scheme(), "ws" | "wss") {
                    return Err(RenderError::Endpoint(raw.clone()));
                }
                Ok(url.to_string())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("websocket endpoint '{0}' is not a ws:// or wss:// URL")]
    Endpoint(String),
}

/// Landing page inputs.
#[derive(Debug, Clone)]
pub struct LandingPage {
    pub title: String,
    pub endpoint: WebsocketEndpoint,
    pub landing_path: String,
}

impl LandingPage {
    pub fn render(&self) -> Result<String, RenderError> {
        let endpoint = self.endpoint.resolve()?;
        Ok(TEMPLATE
            .replace("{{ title }}", &escape_html(&self.title))
            .replace("{{ websocket_endpoint }}", &escape_html(&endpoint))
            .replace("{{ landing_path }}", &escape_html(&self.landing_path)))
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(endpoint: WebsocketEndpoint) -> LandingPage {
        LandingPage {
            title: "Live Proxy Home".into(),
            endpoint,
            landing_path: "/_live-proxy/".into(),
        }
    }

    #[test]
    fn renders_relative_endpoint() {
        let html = page(WebsocketEndpoint::Path("/_live-proxy/ws".into()))
            .render()
            .unwrap();
        assert!(html.contains("<title>Live Proxy Home</title>"));
        assert!(html.contains(r#"ws-connect="/_live-proxy/ws""#));
        assert!(html.contains(r#"id="status-text""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn renders_absolute_endpoint() {
        let html = page(WebsocketEndpoint::Url("wss://dev.example.com/_live-proxy/ws".into()))
            .render()
            .unwrap();
        assert!(html.contains(r#"ws-connect="wss://dev.example.com/_live-proxy/ws""#));
    }

    #[test]
    fn escapes_title() {
        let mut landing = page(WebsocketEndpoint::Path("/ws".into()));
        landing.title = "<api> & \"web\"".into();
        let html = landing.render().unwrap();
        assert!(html.contains("&lt;api&gt; &amp; &quot;web&quot;"));
    }

    #[test]
    fn rejects_http_endpoint() {
        let err = page(WebsocketEndpoint::Url("http://localhost/ws".into()))
            .render()
            .unwrap_err();
        assert!(matches!(err, RenderError::Endpoint(_)));
    }
}
