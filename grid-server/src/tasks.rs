//! Background maintenance for a router node.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::router::Router;

/// Intervals for the maintenance task.
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceConfig {
    /// How often to reload shards and probe balancer settings (ms).
    pub balancer_interval_ms: u64,
    /// How often to reap idle cursors (ms).
    pub cursor_reap_interval_ms: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            balancer_interval_ms: 10_000,
            cursor_reap_interval_ms: 60_000,
        }
    }
}

/// Runs maintenance rounds until `shutdown_rx` fires.
///
/// Catalog failures are logged and retried on the next tick.
pub async fn maintenance_task(
    router: Arc<Router>,
    config: MaintenanceConfig,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut balancer_interval =
        tokio::time::interval(tokio::time::Duration::from_millis(config.balancer_interval_ms));
    let mut reap_interval =
        tokio::time::interval(tokio::time::Duration::from_millis(config.cursor_reap_interval_ms));
    let mut balancer_enabled: Option<bool> = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("Maintenance task shutting down");
                break;
            }
            _ = balancer_interval.tick() => {
                match router.maintenance_round().await {
                    Ok(enabled) => {
                        if balancer_enabled != Some(enabled) {
                            info!(node_id = router.node_id(), enabled, "Balancer state changed");
                            balancer_enabled = Some(enabled);
                        }
                    }
                    Err(e) => {
                        warn!(node_id = router.node_id(), error = %e, "Maintenance round failed");
                    }
                }
            }
            _ = reap_interval.tick() => {
                let killed = router.reap_idle_cursors().await;
                if killed > 0 {
                    info!(node_id = router.node_id(), killed, "Reaped idle cursors");
                }
            }
        }
    }
}
