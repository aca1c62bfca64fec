//! Periodic driver for reservation auto-completion.
//!
//! The engine itself has no notion of cadence: [`Engine::sweep`] is a plain
//! idempotent batch callable from a timer, a message handler, or a manual
//! trigger. `run_sweeper` is the in-process timer variant.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;
use crate::model::Ms;

/// Background task that periodically sweeps expired confirmed reservations.
pub async fn run_sweeper(engine: Arc<Engine>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock before epoch")
            .as_millis() as Ms;
        match engine.sweep(now).await {
            Ok(report) => {
                if !report.completed.is_empty() || !report.errors.is_empty() {
                    info!(
                        "sweep run: {} completed, {} errors",
                        report.completed.len(),
                        report.errors.len()
                    );
                }
            }
            Err(e) => {
                // Whole-batch failure (store unreachable) — retried next tick
                tracing::warn!("sweep run failed: {e}");
            }
        }
    }
}
