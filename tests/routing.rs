//! Request routing tests against a live proxy.

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;

mod common;

const LANDING_MARKER: &str = r#"id="live-proxy-landing""#;

#[tokio::test]
async fn healthy_regardless_of_backend() {
    let backend = common::closed_addr().await;
    let proxy = common::start_proxy(common::test_config(backend)).await;
    let client = common::client();

    let res = client.get(proxy.url("/healthy")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().is_empty());

    common::start_mock_backend(backend, "up").await;
    let res = client.get(proxy.url("/healthy")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn landing_page_while_backend_down() {
    let backend = common::closed_addr().await;
    let proxy = common::start_proxy(common::test_config(backend)).await;
    let client = common::client();

    let res = client.get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    assert!(body.contains(LANDING_MARKER), "expected landing page, got: {body}");
    assert!(body.contains(r#"ws-connect="/_live-proxy/ws""#));
    assert!(body.contains("<title>Live Proxy Home</title>"));

    // Deep links show the landing page too
    let res = client.get(proxy.url("/app/settings?tab=2")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains(LANDING_MARKER));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn landing_page_is_served_directly() {
    let backend = common::closed_addr().await;
    let mut config = common::test_config(backend);
    config.landing.title = "Waiting for web".into();
    let proxy = common::start_proxy(config).await;

    let res = common::client().get(proxy.url("/_live-proxy/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(res.text().await.unwrap().contains("<title>Waiting for web</title>"));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn forwards_to_backend_when_up() {
    let backend = common::closed_addr().await;
    common::start_mock_backend(backend, "hello from backend").await;
    let proxy = common::start_proxy(common::test_config(backend)).await;

    let res = common::client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    assert_eq!(res.text().await.unwrap(), "hello from backend");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let backend = common::closed_addr().await;
    common::start_hangup_backend(backend).await;
    let proxy = common::start_proxy(common::test_config(backend)).await;

    let res = common::client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    // The proxy itself stays healthy
    let res = common::client().get(proxy.url("/healthy")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn switches_once_backend_starts() {
    let backend = common::closed_addr().await;
    let proxy = common::start_proxy(common::test_config(backend)).await;
    let client = common::client();

    let body = client.get(proxy.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(body.contains(LANDING_MARKER));

    common::start_mock_backend(backend, "started").await;
    let body = client.get(proxy.url("/")).send().await.unwrap().text().await.unwrap();
    assert_eq!(body, "started");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn upgrade_requests_are_tunneled_to_backend() {
    async fn echo(ws: WebSocketUpgrade) -> Response {
        ws.on_upgrade(|mut socket| async move {
            while let Some(Ok(message)) = socket.recv().await {
                if let Message::Text(_) = message {
                    if socket.send(message).await.is_err() {
                        break;
                    }
                }
            }
        })
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let app = Router::new().route("/echo", get(echo));
        let _ = axum::serve(listener, app).await;
    });

    let proxy = common::start_proxy(common::test_config(backend)).await;
    let (mut ws, _) = connect_async(proxy.ws_url("/echo")).await.unwrap();

    ws.send(tungstenite::Message::Text("ping".into())).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("no echo through the proxy")
        .unwrap()
        .unwrap();
    assert_eq!(reply.to_text().unwrap(), "ping");

    proxy.shutdown.trigger();
}
