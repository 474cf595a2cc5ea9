//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_nonces_issued_total` (counter)
//! - `guard_entropy_failures_total` (counter)
//! - `guard_cookie_rejected_total` (counter): label `reason`
//! - `guard_flash_reads_total` (counter)
//! - `guard_static_requests_total` (counter): label `status`
//!
//! # Design Decisions
//! - Rejection reasons are recorded server-side only; clients always see an
//!   absent cookie
//! - Recording is a no-op until a recorder is installed

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_nonce_issued() {
    counter!("guard_nonces_issued_total").increment(1);
}

pub fn record_entropy_failure() {
    counter!("guard_entropy_failures_total").increment(1);
}

pub fn record_cookie_rejected(reason: &'static str) {
    counter!("guard_cookie_rejected_total", "reason" => reason).increment(1);
}

pub fn record_flash_read() {
    counter!("guard_flash_reads_total").increment(1);
}

pub fn record_static_request(status: u16) {
    counter!("guard_static_requests_total", "status" => status.to_string()).increment(1);
}
