//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_rate_limited_total` (counter): requests denied by the limiter
//! - `gate_auth_failures_total` (counter): authentication failures by reason
//! - `gate_permission_denied_total` (counter): authorization denials
//! - `gate_limiter_clients` (gauge): client buckets currently tracked
//!
//! # Design Decisions
//! - Low-overhead updates (atomic operations behind the `metrics` macros)
//! - Prometheus exposition on its own listener, separate from the gate

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own address.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %e, "Failed to install Prometheus exporter");
    }
}

pub fn record_rate_limited() {
    counter!("gate_rate_limited_total").increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    counter!("gate_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_permission_denied() {
    counter!("gate_permission_denied_total").increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("gate_limiter_clients").set(count as f64);
}
