//! Metrics collection and exposition.
//!
//! # Metrics
//! - `live_proxy_route_decisions_total` (counter): routed requests by destination
//! - `live_proxy_route_duration_seconds` (histogram): decide + forward latency
//! - `live_proxy_probe_duration_seconds` (histogram): probe latency by outcome
//! - `live_proxy_status_sessions_active` (gauge): open status channel sessions
//! - `live_proxy_status_messages_total` (counter): status payloads sent by kind
//!
//! Recording is a no-op until an exporter is installed.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_route(destination: &'static str, status: u16, start: Instant) {
    counter!(
        "live_proxy_route_decisions_total",
        "destination" => destination,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("live_proxy_route_duration_seconds", "destination" => destination)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_probe(outcome: &'static str, start: Instant) {
    histogram!("live_proxy_probe_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn set_active_sessions(count: usize) {
    gauge!("live_proxy_status_sessions_active").set(count as f64);
}

pub fn record_status_message(kind: &'static str) {
    counter!("live_proxy_status_messages_total", "kind" => kind).increment(1);
}
