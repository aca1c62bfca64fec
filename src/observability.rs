use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: reservations accepted by the conflict resolver.
pub const RESERVATIONS_CREATED_TOTAL: &str = "gearbook_reservations_created_total";

/// Counter: booking requests rejected for insufficient quantity.
pub const RESERVATIONS_REJECTED_TOTAL: &str = "gearbook_reservations_rejected_total";

/// Counter: confirm transitions applied.
pub const RESERVATIONS_CONFIRMED_TOTAL: &str = "gearbook_reservations_confirmed_total";

/// Counter: cancel transitions applied.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "gearbook_reservations_cancelled_total";

// ── Sweeper metrics ─────────────────────────────────────────────

/// Counter: reservations auto-completed by the sweeper.
pub const SWEEP_COMPLETED_TOTAL: &str = "gearbook_sweep_completed_total";

/// Counter: per-item sweep failures (skipped, retried next run).
pub const SWEEP_ERRORS_TOTAL: &str = "gearbook_sweep_errors_total";

/// Histogram: duration of one sweep run in seconds.
pub const SWEEP_DURATION_SECONDS: &str = "gearbook_sweep_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
