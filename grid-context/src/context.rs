//! The process-wide sharding context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use grid_catalog::{BalancerSettings, CatalogError, CatalogManager, ConfigServerMode, DatabaseType, ShardType};
use grid_core::OperationContext;
use grid_routing::{CatalogCache, ClusterCursorManager, ShardRegistry};
use tracing::{debug, info, trace, warn};

use crate::balancer::should_balance;
use crate::config::GridConfig;
use crate::error::ContextResult;
use crate::guard::CatalogManagerGuard;
use crate::swap_cell::SwapCell;
use crate::transition::{evaluate_transition, SwapDecision, SwapOutcome};

/// Subsystems installed by `init`.
#[derive(Debug)]
struct Subsystems {
    catalog_cache: CatalogCache,
    shard_registry: ShardRegistry,
    cursor_manager: ClusterCursorManager,
    catalog_manager: SwapCell<Box<dyn CatalogManager>>,
}

/// A manager offered to a swap and not yet installed.
///
/// If the swap is abandoned before install, the manager is shut down on a
/// spawned task.
struct OfferedManager {
    manager: Option<Box<dyn CatalogManager>>,
}

impl OfferedManager {
    fn new(manager: Box<dyn CatalogManager>) -> Self {
        Self {
            manager: Some(manager),
        }
    }

    fn into_inner(mut self) -> Box<dyn CatalogManager> {
        self.manager.take().expect("offered manager taken twice")
    }
}

impl Drop for OfferedManager {
    fn drop(&mut self) {
        let Some(manager) = self.manager.take() else {
            return;
        };
        let mode = manager.mode();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(mode = %mode, "Catalog manager swap abandoned; shutting down offered manager");
                handle.spawn(async move {
                    manager.shut_down().await;
                });
            }
            Err(_) => {
                warn!(mode = %mode, "Catalog manager swap abandoned outside a runtime; offered manager dropped");
            }
        }
    }
}

/// Holds the sharding subsystems for one running node.
///
/// # Lifecycle
///
/// Construct one context at startup with [`Self::new`], call [`Self::init`]
/// exactly once, then share it by reference (typically `Arc<SharedContext>`)
/// with every component that needs sharding state. After `init`, every
/// accessor returns the same catalog cache, shard registry and cursor manager
/// for the rest of the process.
///
/// # Thread Safety
///
/// The context is `Send + Sync`. The catalog manager is the only member that
/// can change after `init`; see [`Self::access_catalog_manager`] and
/// [`Self::swap_catalog_manager`].
#[derive(Debug)]
pub struct SharedContext {
    config: GridConfig,
    /// Can shards and config servers use local host addresses?
    allow_local_host: AtomicBool,
    subsystems: OnceLock<Subsystems>,
}

impl SharedContext {
    /// Creates an uninitialized context.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            allow_local_host: AtomicBool::new(config.allow_local_host),
            subsystems: OnceLock::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Installs the sharding subsystems. Must be called once and only once.
    ///
    /// Takes ownership of the catalog manager, shard registry and cursor
    /// manager, and builds the catalog cache from the configuration.
    ///
    /// # Panics
    ///
    /// Panics if the context was already initialized. The previously
    /// installed subsystems are left untouched.
    pub fn init(
        &self,
        catalog_manager: Box<dyn CatalogManager>,
        shard_registry: ShardRegistry,
        cursor_manager: ClusterCursorManager,
    ) {
        let mode = catalog_manager.mode();
        let subsystems = Subsystems {
            catalog_cache: CatalogCache::new(self.config.catalog_cache),
            shard_registry,
            cursor_manager,
            catalog_manager: SwapCell::new(catalog_manager),
        };

        let installed = self.subsystems.set(subsystems).is_ok();
        assert!(installed, "sharding context initialized twice");
        info!(mode = %mode, "Sharding context initialized");
    }

    /// Returns true once `init` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.subsystems.get().is_some()
    }

    fn subsystems(&self) -> &Subsystems {
        self.subsystems
            .get()
            .expect("sharding context used before init")
    }

    /// Returns the catalog cache.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    #[must_use]
    pub fn catalog_cache(&self) -> &CatalogCache {
        &self.subsystems().catalog_cache
    }

    /// Returns the shard registry.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    #[must_use]
    pub fn shard_registry(&self) -> &ShardRegistry {
        &self.subsystems().shard_registry
    }

    /// Returns the cluster cursor manager.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    #[must_use]
    pub fn cursor_manager(&self) -> &ClusterCursorManager {
        &self.subsystems().cursor_manager
    }

    /// Returns true if shards and config servers may use local host addresses.
    #[must_use]
    pub fn allow_local_host(&self) -> bool {
        self.allow_local_host.load(Ordering::Relaxed)
    }

    /// Sets whether shards and config servers may use local host addresses.
    ///
    /// Intended for startup configuration, before steady-state traffic.
    pub fn set_allow_local_host(&self, allow: bool) {
        self.allow_local_host.store(allow, Ordering::Relaxed);
    }

    // -------------------------------------------------------------------------
    // Catalog Manager Access
    // -------------------------------------------------------------------------

    /// Returns a guard pinning the active catalog manager.
    ///
    /// Returns immediately unless a swap is queued or in progress, in which
    /// case it waits for the swap to finish and pins the new manager. There
    /// is no timeout; callers that need a deadline wrap this future in
    /// `tokio::time::timeout`. Dropping the pending future withdraws the
    /// request.
    ///
    /// # Deadlocks
    ///
    /// Never call this while the same task holds a guard. A queued swap
    /// waits for the held guard, and this call waits behind the queued swap.
    /// Pass the held guard to the `*_with` helpers instead.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn access_catalog_manager(&self, op: &OperationContext) -> CatalogManagerGuard<'_> {
        let guard = self.subsystems().catalog_manager.read().await;
        trace!(op_id = %op.op_id(), epoch = %guard.epoch(), "Granted catalog manager access");
        CatalogManagerGuard::new(guard)
    }

    /// Checks whether the active catalog manager can move to `desired`.
    ///
    /// Performs no mutation. Holds the writer mutex while reading the active
    /// mode, so the answer is not interleaved with a concurrent swap.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleCatalogManager` if `desired` is legacy while the
    /// active manager speaks consensus.
    ///
    /// # Deadlocks
    ///
    /// Never call this while the same task holds a guard: a queued swap owns
    /// the writer mutex until the guard drops. Use
    /// [`Self::check_if_catalog_needs_swapping_with`] instead.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn check_if_catalog_needs_swapping(
        &self,
        desired: ConfigServerMode,
    ) -> ContextResult<SwapDecision> {
        let writer = self.subsystems().catalog_manager.lock_writer().await;
        let current = writer.peek(|manager, _| manager.mode()).await;
        drop(writer);

        Self::decide(current, desired)
    }

    /// Checks whether the manager pinned by `catalog` can move to `desired`.
    ///
    /// The answer holds for the pinned manager; a swap queued behind
    /// `catalog` may change the active manager once it drops.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleCatalogManager` for a consensus to legacy downgrade.
    pub fn check_if_catalog_needs_swapping_with(
        catalog: &CatalogManagerGuard<'_>,
        desired: ConfigServerMode,
    ) -> ContextResult<SwapDecision> {
        Self::decide(catalog.mode(), desired)
    }

    fn decide(current: ConfigServerMode, desired: ConfigServerMode) -> ContextResult<SwapDecision> {
        let decision = evaluate_transition(current, desired);
        if decision.is_err() {
            warn!(current = %current, desired = %desired, "Rejected catalog manager downgrade");
        }
        decision
    }

    /// Replaces the active catalog manager with `replacement`.
    ///
    /// Holds the writer mutex throughout, so the compatibility check and the
    /// replacement are atomic with respect to other swaps. The exclusive lock
    /// is taken only for the replacement itself and waits for every
    /// outstanding guard. The retired manager is shut down and dropped after
    /// both locks are released.
    ///
    /// If `replacement` is rejected or speaks the active mode already,
    /// nothing changes and `replacement` is shut down unused. The same holds
    /// if this future is dropped before the replacement is installed; the
    /// shutdown then runs on a spawned task.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleCatalogManager` for a downgrade. The active
    /// manager is unchanged.
    ///
    /// # Deadlocks
    ///
    /// Never call this while the same task holds a guard; the swap waits for
    /// that guard forever.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn swap_catalog_manager(
        &self,
        op: &OperationContext,
        replacement: Box<dyn CatalogManager>,
    ) -> ContextResult<SwapOutcome> {
        let desired = replacement.mode();
        let offered = OfferedManager::new(replacement);

        let writer = self.subsystems().catalog_manager.lock_writer().await;
        let (current, current_epoch) = writer.peek(|manager, epoch| (manager.mode(), epoch)).await;

        match evaluate_transition(current, desired) {
            Ok(SwapDecision::SwapRequired) => {}
            Ok(SwapDecision::AlreadyInMode) => {
                drop(writer);
                debug!(op_id = %op.op_id(), mode = %current, "Catalog manager already in desired mode");
                offered.into_inner().shut_down().await;
                return Ok(SwapOutcome::AlreadyInMode {
                    mode: current,
                    epoch: current_epoch,
                });
            }
            Err(err) => {
                drop(writer);
                warn!(
                    op_id = %op.op_id(),
                    current = %current,
                    desired = %desired,
                    "Rejected catalog manager swap"
                );
                offered.into_inner().shut_down().await;
                return Err(err);
            }
        }

        info!(op_id = %op.op_id(), from = %current, to = %desired, "Swapping catalog manager");
        let exclusive = writer.exclusive().await;
        let (retired, epoch) = exclusive.install(offered.into_inner());
        info!(op_id = %op.op_id(), epoch = %epoch, mode = %desired, "Catalog manager swapped");

        // No guard can reach `retired` any more.
        retired.shut_down().await;
        drop(retired);

        Ok(SwapOutcome::Swapped {
            from: current,
            to: desired,
            epoch,
        })
    }

    // -------------------------------------------------------------------------
    // Balancer
    // -------------------------------------------------------------------------

    /// Returns true if `settings` allow the balancer to run at `current_time_us`.
    #[must_use]
    pub fn should_balance(&self, settings: &BalancerSettings, current_time_us: u64) -> bool {
        should_balance(settings, current_time_us)
    }

    /// Reads the balancer settings from the catalog and evaluates them.
    ///
    /// A missing settings document means the balancer should run.
    ///
    /// # Errors
    ///
    /// Propagates the catalog error if the settings cannot be fetched.
    ///
    /// # Deadlocks
    ///
    /// Takes a guard internally. Never call this while the same task holds a
    /// guard; use [`Self::get_config_should_balance_with`].
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn get_config_should_balance(
        &self,
        op: &OperationContext,
        current_time_us: u64,
    ) -> ContextResult<bool> {
        let catalog = self.access_catalog_manager(op).await;
        Self::get_config_should_balance_with(&catalog, op, current_time_us).await
    }

    /// Same as [`Self::get_config_should_balance`], through a guard the caller holds.
    ///
    /// # Errors
    ///
    /// Propagates the catalog error if the settings cannot be fetched.
    pub async fn get_config_should_balance_with(
        catalog: &CatalogManagerGuard<'_>,
        op: &OperationContext,
        current_time_us: u64,
    ) -> ContextResult<bool> {
        let settings = catalog.get_balancer_settings(op).await?;
        Ok(settings.map_or(true, |settings| should_balance(&settings, current_time_us)))
    }

    // -------------------------------------------------------------------------
    // Metadata Helpers
    // -------------------------------------------------------------------------

    /// Returns the database entry for `name`, creating the database unsharded
    /// if it does not exist.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors other than a lost creation race.
    ///
    /// # Deadlocks
    ///
    /// Takes a guard internally. Never call this while the same task holds a
    /// guard; use [`Self::implicit_create_db_with`].
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn implicit_create_db(
        &self,
        op: &OperationContext,
        name: &str,
    ) -> ContextResult<Arc<DatabaseType>> {
        let catalog = self.access_catalog_manager(op).await;
        self.implicit_create_db_with(&catalog, op, name).await
    }

    /// Same as [`Self::implicit_create_db`], through a guard the caller holds.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors other than a lost creation race.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn implicit_create_db_with(
        &self,
        catalog: &CatalogManagerGuard<'_>,
        op: &OperationContext,
        name: &str,
    ) -> ContextResult<Arc<DatabaseType>> {
        let cache = self.catalog_cache();

        match cache.get_database(op, catalog.get(), name).await {
            Ok(database) => return Ok(database),
            Err(CatalogError::DatabaseNotFound { .. }) => {}
            Err(err) => return Err(err.into()),
        }

        match catalog.create_database(op, name).await {
            Ok(database) => {
                info!(op_id = %op.op_id(), database = name, primary = %database.primary, "Implicitly created database");
                Ok(cache.insert(database).await)
            }
            // Another router created it first.
            Err(CatalogError::DatabaseExists { .. }) => {
                Ok(cache.get_database(op, catalog.get(), name).await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Refreshes the shard registry from the catalog.
    ///
    /// Returns the number of shards now registered.
    ///
    /// # Errors
    ///
    /// Propagates catalog and registry errors; the registry is unchanged on error.
    ///
    /// # Deadlocks
    ///
    /// Takes a guard internally. Never call this while the same task holds a
    /// guard; use [`Self::reload_shard_registry_with`].
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn reload_shard_registry(&self, op: &OperationContext) -> ContextResult<usize> {
        let shards = {
            let catalog = self.access_catalog_manager(op).await;
            catalog.get_all_shards(op).await?
        };

        Ok(self.shard_registry().reload(shards).await?)
    }

    /// Same as [`Self::reload_shard_registry`], through a guard the caller holds.
    ///
    /// # Errors
    ///
    /// Propagates catalog and registry errors; the registry is unchanged on error.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn reload_shard_registry_with(
        &self,
        catalog: &CatalogManagerGuard<'_>,
        op: &OperationContext,
    ) -> ContextResult<usize> {
        let shards = catalog.get_all_shards(op).await?;
        Ok(self.shard_registry().reload(shards).await?)
    }

    /// Registers a shard, honoring the allow-local-host flag.
    ///
    /// # Errors
    ///
    /// Returns the registry's error if the host is rejected or the registry is full.
    ///
    /// # Panics
    ///
    /// Panics if called before `init`.
    pub async fn register_shard(&self, shard: ShardType) -> ContextResult<()> {
        Ok(self
            .shard_registry()
            .add_shard(shard, self.allow_local_host())
            .await?)
    }

    // -------------------------------------------------------------------------
    // Testing
    // -------------------------------------------------------------------------

    /// Tears down every subsystem so `init` can be called again.
    ///
    /// Requires exclusive access, so no guard can be outstanding.
    ///
    /// NOTE: Do not use this outside of tests.
    pub fn clear_for_unit_tests(&mut self) {
        self.subsystems.take();
        self.allow_local_host
            .store(self.config.allow_local_host, Ordering::Relaxed);
        debug!("Sharding context cleared");
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use grid_catalog::{ActiveWindow, SimulatedCatalogManager};
    use grid_core::{Epoch, OpId, ShardId};
    use grid_routing::{CursorManagerConfig, ShardRegistryConfig};

    use super::*;
    use crate::ContextError;

    const MINUTE_US: u64 = 60 * 1_000_000;

    fn op() -> OperationContext {
        OperationContext::new(OpId::new(1), 0)
    }

    fn legacy_catalog() -> SimulatedCatalogManager {
        let catalog = SimulatedCatalogManager::new(42, ConfigServerMode::Legacy);
        catalog.add_shard(ShardType::new(ShardId::new(1), "shard1.example.net:27018"));
        catalog.add_shard(ShardType::new(ShardId::new(2), "shard2.example.net:27018"));
        catalog
    }

    fn init_context(catalog: &SimulatedCatalogManager) -> SharedContext {
        let context = SharedContext::new(GridConfig::for_testing());
        context.init(
            Box::new(catalog.clone()),
            ShardRegistry::new(ShardRegistryConfig::default()),
            ClusterCursorManager::new(CursorManagerConfig::for_testing()),
        );
        context
    }

    #[tokio::test]
    async fn test_init_installs_catalog_manager() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);

        assert!(context.is_initialized());
        let guard = context.access_catalog_manager(&op()).await;
        assert_eq!(guard.mode(), ConfigServerMode::Legacy);
        assert_eq!(guard.epoch(), Epoch::new(1));
        assert_eq!(context.shard_registry().len().await, 0);
        assert!(context.catalog_cache().is_empty().await);
    }

    #[test]
    #[should_panic(expected = "initialized twice")]
    fn test_double_init_panics() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);
        context.init(
            Box::new(catalog.with_mode(ConfigServerMode::Consensus)),
            ShardRegistry::default(),
            ClusterCursorManager::default(),
        );
    }

    #[tokio::test]
    async fn test_double_init_keeps_original_subsystems() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);

        let second = catch_unwind(AssertUnwindSafe(|| {
            context.init(
                Box::new(catalog.with_mode(ConfigServerMode::Consensus)),
                ShardRegistry::default(),
                ClusterCursorManager::default(),
            );
        }));
        assert!(second.is_err());

        let guard = context.access_catalog_manager(&op()).await;
        assert_eq!(guard.mode(), ConfigServerMode::Legacy);
        assert_eq!(context.cursor_manager().config().max_cursors, 16);
    }

    #[test]
    #[should_panic(expected = "used before init")]
    fn test_accessor_before_init_panics() {
        let context = SharedContext::new(GridConfig::default());
        let _ = context.shard_registry();
    }

    #[test]
    fn test_allow_local_host_flag() {
        let context = SharedContext::new(GridConfig::default());
        assert!(!context.allow_local_host());
        context.set_allow_local_host(true);
        assert!(context.allow_local_host());
    }

    #[tokio::test]
    async fn test_check_if_catalog_needs_swapping() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);

        assert_eq!(
            context
                .check_if_catalog_needs_swapping(ConfigServerMode::Legacy)
                .await,
            Ok(SwapDecision::AlreadyInMode)
        );
        assert_eq!(
            context
                .check_if_catalog_needs_swapping(ConfigServerMode::Consensus)
                .await,
            Ok(SwapDecision::SwapRequired)
        );
        // The check itself changes nothing.
        assert_eq!(
            context.access_catalog_manager(&op()).await.mode(),
            ConfigServerMode::Legacy
        );
    }

    #[tokio::test]
    async fn test_swap_to_consensus_then_reject_downgrade() {
        let legacy = legacy_catalog();
        let context = init_context(&legacy);
        let consensus = legacy.with_mode(ConfigServerMode::Consensus);

        let outcome = context
            .swap_catalog_manager(&op(), Box::new(consensus.clone()))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SwapOutcome::Swapped {
                from: ConfigServerMode::Legacy,
                to: ConfigServerMode::Consensus,
                epoch: Epoch::new(2),
            }
        );
        assert!(legacy.is_shut_down());
        assert!(!consensus.is_shut_down());

        let err = context
            .check_if_catalog_needs_swapping(ConfigServerMode::Legacy)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::IncompatibleCatalogManager { .. }));

        let downgrade = legacy.with_mode(ConfigServerMode::Legacy);
        let err = context
            .swap_catalog_manager(&op(), Box::new(downgrade.clone()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ContextError::IncompatibleCatalogManager {
                current: ConfigServerMode::Consensus,
                desired: ConfigServerMode::Legacy,
            }
        );
        assert!(downgrade.is_shut_down());

        let guard = context.access_catalog_manager(&op()).await;
        assert_eq!(guard.mode(), ConfigServerMode::Consensus);
        assert_eq!(guard.epoch(), Epoch::new(2));
    }

    #[tokio::test]
    async fn test_same_mode_swap_is_noop() {
        let legacy = legacy_catalog();
        let context = init_context(&legacy);
        let offered = legacy.with_mode(ConfigServerMode::Legacy);

        let outcome = context
            .swap_catalog_manager(&op(), Box::new(offered.clone()))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SwapOutcome::AlreadyInMode {
                mode: ConfigServerMode::Legacy,
                epoch: Epoch::new(1),
            }
        );
        assert!(offered.is_shut_down());
        assert!(!legacy.is_shut_down());
    }

    #[tokio::test]
    async fn test_get_config_should_balance() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);

        // No settings document.
        assert!(context.get_config_should_balance(&op(), 0).await.unwrap());

        catalog.set_balancer_settings(Some(BalancerSettings::stopped()));
        assert!(!context.get_config_should_balance(&op(), 0).await.unwrap());

        let window = ActiveWindow::parse("02:00", "04:00").unwrap();
        catalog.set_balancer_settings(Some(BalancerSettings::default().with_active_window(window)));
        assert!(context
            .get_config_should_balance(&op(), 3 * 60 * MINUTE_US)
            .await
            .unwrap());
        assert!(!context
            .get_config_should_balance(&op(), 5 * 60 * MINUTE_US)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_get_config_should_balance_propagates_fetch_failure() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);
        catalog.fault_config().force_read_fail = true;

        let err = context.get_config_should_balance(&op(), 0).await.unwrap_err();
        assert!(matches!(
            err,
            ContextError::Catalog(CatalogError::Unreachable { .. })
        ));
    }

    #[tokio::test]
    async fn test_implicit_create_db() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);

        let created = context.implicit_create_db(&op(), "orders").await.unwrap();
        assert_eq!(created.primary, ShardId::new(1));
        assert_eq!(catalog.database_count(), 1);

        // Second call is served from the cache.
        let again = context.implicit_create_db(&op(), "orders").await.unwrap();
        assert!(Arc::ptr_eq(&created, &again));
        assert_eq!(catalog.database_count(), 1);
    }

    #[tokio::test]
    async fn test_implicit_create_db_propagates_failure() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);
        catalog.fault_config().force_write_fail = true;

        let err = context.implicit_create_db(&op(), "orders").await.unwrap_err();
        assert!(matches!(
            err,
            ContextError::Catalog(CatalogError::Unreachable { .. })
        ));
        assert!(context.catalog_cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_reload_shard_registry() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);

        let count = context.reload_shard_registry(&op()).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            context.shard_registry().shard_ids().await,
            vec![ShardId::new(1), ShardId::new(2)]
        );
    }

    #[tokio::test]
    async fn test_register_shard_honors_local_host_flag() {
        let catalog = legacy_catalog();
        let context = init_context(&catalog);
        context.set_allow_local_host(false);

        let err = context
            .register_shard(ShardType::new(ShardId::new(9), "localhost:27018"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::Routing(_)));

        context.set_allow_local_host(true);
        context
            .register_shard(ShardType::new(ShardId::new(9), "localhost:27018"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_for_unit_tests_allows_reinit() {
        let catalog = legacy_catalog();
        let mut context = init_context(&catalog);
        context.set_allow_local_host(false);

        context.clear_for_unit_tests();
        assert!(!context.is_initialized());
        assert!(context.allow_local_host());

        context.init(
            Box::new(catalog.with_mode(ConfigServerMode::Consensus)),
            ShardRegistry::default(),
            ClusterCursorManager::default(),
        );
        let guard = context.access_catalog_manager(&op()).await;
        assert_eq!(guard.mode(), ConfigServerMode::Consensus);
        assert_eq!(guard.epoch(), Epoch::new(1));
    }
}
