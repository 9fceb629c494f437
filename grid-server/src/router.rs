//! Router node state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use grid_catalog::{CatalogManager, ConfigServerMode, ShardType};
use grid_context::{ContextResult, GridConfig, SharedContext, SwapDecision, SwapOutcome};
use grid_core::{Limits, OpId, OperationContext};
use grid_routing::{ClusterCursorManager, CursorManagerConfig, ShardRegistry, ShardRegistryConfig};
use tracing::{debug, info};

use crate::error::{ServerError, ServerResult};

/// Returns the current time in microseconds.
#[must_use]
pub fn current_time_us() -> u64 {
    #[allow(clippy::cast_possible_truncation)]
    let now_us = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_micros() as u64);
    now_us
}

/// A router node: one sharding context plus an operation id source.
#[derive(Debug)]
pub struct Router {
    node_id: u64,
    context: Arc<SharedContext>,
    next_op_id: AtomicU64,
}

impl Router {
    /// Builds the sharding context from `limits` and installs `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error if `limits` are invalid.
    pub fn start(
        node_id: u64,
        limits: &Limits,
        allow_local_host: bool,
        catalog: Box<dyn CatalogManager>,
    ) -> ServerResult<Self> {
        let config = GridConfig::from_limits(limits)?.with_allow_local_host(allow_local_host);
        let context = SharedContext::new(config);
        context.init(
            catalog,
            ShardRegistry::new(ShardRegistryConfig::from_limits(limits)),
            ClusterCursorManager::new(CursorManagerConfig::from_limits(limits)),
        );

        info!(node_id, allow_local_host, "Router started");
        Ok(Self {
            node_id,
            context: Arc::new(context),
            next_op_id: AtomicU64::new(1),
        })
    }

    /// Returns this node's id.
    #[must_use]
    pub const fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Returns the sharding context.
    #[must_use]
    pub const fn context(&self) -> &Arc<SharedContext> {
        &self.context
    }

    /// Starts a new logical operation.
    pub fn new_operation(&self) -> OperationContext {
        let op_id = OpId::new(self.next_op_id.fetch_add(1, Ordering::Relaxed));
        OperationContext::new(op_id, current_time_us())
    }

    /// Registers a shard given on the command line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShard` if the registry rejects the host.
    pub async fn register_shard(&self, shard: ShardType) -> ServerResult<()> {
        let spec = format!("{}:{}", shard.id.get(), shard.host);
        self.context
            .register_shard(shard)
            .await
            .map_err(|e| ServerError::InvalidShard {
                spec,
                reason: e.to_string(),
            })
    }

    /// Migrates the catalog manager to `replacement`'s mode.
    ///
    /// Checks compatibility first so a downgrade is reported before anything
    /// else happens.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleCatalogManager` if the migration would downgrade.
    pub async fn migrate_catalog(
        &self,
        replacement: Box<dyn CatalogManager>,
    ) -> ContextResult<SwapOutcome> {
        let op = self.new_operation();
        let desired: ConfigServerMode = replacement.mode();

        if let Err(err) = self.context.check_if_catalog_needs_swapping(desired).await {
            replacement.shut_down().await;
            return Err(err);
        }
        let outcome = self.context.swap_catalog_manager(&op, replacement).await?;
        debug!(
            op_id = %op.op_id(),
            elapsed_us = op.elapsed_us(current_time_us()),
            "Catalog migration finished"
        );
        Ok(outcome)
    }

    /// Refreshes the shard registry and evaluates the balancer settings.
    ///
    /// Returns whether the balancer may run now.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors from either step.
    pub async fn maintenance_round(&self) -> ContextResult<bool> {
        let op = self.new_operation();
        self.context.reload_shard_registry(&op).await?;
        self.context
            .get_config_should_balance(&op, current_time_us())
            .await
    }

    /// Kills cursors that have been idle past the configured timeout.
    pub async fn reap_idle_cursors(&self) -> usize {
        self.context
            .cursor_manager()
            .kill_idle_cursors(current_time_us())
            .await
    }

    /// Returns true if the active catalog manager already speaks `mode`.
    pub async fn is_in_mode(&self, mode: ConfigServerMode) -> bool {
        matches!(
            self.context.check_if_catalog_needs_swapping(mode).await,
            Ok(SwapDecision::AlreadyInMode)
        )
    }
}
