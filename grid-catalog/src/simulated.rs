//! In-memory catalog manager for deterministic simulation testing.

#![allow(clippy::significant_drop_tightening)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use grid_core::{OperationContext, ShardId};
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::manager::CatalogManager;
use crate::types::{BalancerSettings, ConfigServerMode, DatabaseType, ShardType};

// -----------------------------------------------------------------------------
// Fault Configuration
// -----------------------------------------------------------------------------

/// Fault configuration for the simulated catalog manager.
#[derive(Debug, Clone, Default)]
pub struct CatalogFaultConfig {
    /// Probability of read operations failing (0.0 - 1.0).
    pub read_fail_rate: f64,
    /// Probability of write operations failing (0.0 - 1.0).
    pub write_fail_rate: f64,
    /// Force next read to fail (one-shot).
    pub force_read_fail: bool,
    /// Force next write to fail (one-shot).
    pub force_write_fail: bool,
}

impl CatalogFaultConfig {
    /// No faults (all operations succeed).
    #[must_use]
    pub const fn none() -> Self {
        Self {
            read_fail_rate: 0.0,
            write_fail_rate: 0.0,
            force_read_fail: false,
            force_write_fail: false,
        }
    }

    /// Flaky configuration for stress testing.
    #[must_use]
    pub const fn flaky() -> Self {
        Self {
            read_fail_rate: 0.05,
            write_fail_rate: 0.05,
            force_read_fail: false,
            force_write_fail: false,
        }
    }

    /// Builder: set read fail rate.
    #[must_use]
    pub const fn with_read_fail_rate(mut self, rate: f64) -> Self {
        self.read_fail_rate = rate;
        self
    }

    /// Builder: set write fail rate.
    #[must_use]
    pub const fn with_write_fail_rate(mut self, rate: f64) -> Self {
        self.write_fail_rate = rate;
        self
    }
}

// -----------------------------------------------------------------------------
// Simulated Catalog Manager
// -----------------------------------------------------------------------------

/// Metadata held by the simulated config servers.
#[derive(Debug, Default)]
struct CatalogState {
    databases: BTreeMap<String, DatabaseType>,
    shards: BTreeMap<ShardId, ShardType>,
    balancer: Option<BalancerSettings>,
}

/// In-memory simulated catalog manager for DST.
///
/// A clone is another handle to the same manager: it shares metadata, fault
/// configuration and the shut-down flag, so shutting down any handle shuts
/// down all of them. Tests keep a clone to observe a manager after handing it
/// to a context. Never offer a clone of the active manager to a swap; the
/// offered manager is shut down when it is not installed.
///
/// [`Self::with_mode`] is the only way to get an independent manager. It
/// speaks the given protocol over the same metadata, which is what a config
/// server migration looks like from the router's side.
#[derive(Debug, Clone)]
pub struct SimulatedCatalogManager {
    /// Protocol this instance speaks.
    mode: ConfigServerMode,
    /// Shared metadata.
    state: Arc<Mutex<CatalogState>>,
    /// Fault configuration.
    fault_config: Arc<Mutex<CatalogFaultConfig>>,
    /// RNG seed for deterministic faults.
    seed: u64,
    /// Operation counter for deterministic RNG.
    counter: Arc<AtomicU64>,
    /// Set once `shut_down` has run on this instance.
    shut_down: Arc<AtomicBool>,
}

impl SimulatedCatalogManager {
    /// Creates a new simulated manager with no faults.
    #[must_use]
    pub fn new(seed: u64, mode: ConfigServerMode) -> Self {
        Self::with_faults(seed, mode, CatalogFaultConfig::none())
    }

    /// Creates a simulated manager with fault injection.
    #[must_use]
    pub fn with_faults(seed: u64, mode: ConfigServerMode, config: CatalogFaultConfig) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(CatalogState::default())),
            fault_config: Arc::new(Mutex::new(config)),
            seed,
            counter: Arc::new(AtomicU64::new(0)),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a manager in `mode` that shares this manager's metadata.
    ///
    /// The new manager has its own fault configuration and shut-down flag.
    #[must_use]
    pub fn with_mode(&self, mode: ConfigServerMode) -> Self {
        Self {
            mode,
            state: Arc::clone(&self.state),
            fault_config: Arc::new(Mutex::new(CatalogFaultConfig::none())),
            seed: self.seed,
            counter: Arc::new(AtomicU64::new(0)),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns fault config for modification.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn fault_config(&self) -> MutexGuard<'_, CatalogFaultConfig> {
        self.fault_config.lock().expect("fault config lock poisoned")
    }

    /// Adds a shard directly (bypasses faults, for test setup).
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn add_shard(&self, shard: ShardType) {
        let mut state = self.state.lock().expect("catalog lock poisoned");
        state.shards.insert(shard.id, shard);
    }

    /// Sets or clears the balancer settings document (bypasses faults).
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_balancer_settings(&self, settings: Option<BalancerSettings>) {
        let mut state = self.state.lock().expect("catalog lock poisoned");
        state.balancer = settings;
    }

    /// Returns database count (bypasses faults, for assertions in tests).
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn database_count(&self) -> usize {
        let state = self.state.lock().expect("catalog lock poisoned");
        state.databases.len()
    }

    /// Returns true once `shut_down` has run on this instance.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Deterministic RNG: `(seed + counter) * M`.
    fn should_inject_fault(&self, rate: f64) -> bool {
        if rate <= 0.0 {
            return false;
        }
        if rate >= 1.0 {
            return true;
        }
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        let hash = self
            .seed
            .wrapping_add(counter)
            .wrapping_mul(0x9e37_79b9_7f4a_7c15);
        #[allow(clippy::cast_precision_loss)]
        let normalized = (hash as f64) / (u64::MAX as f64);
        normalized < rate
    }

    fn check_read_fault(&self, operation: &'static str) -> CatalogResult<()> {
        let rate = {
            let mut config = self.fault_config.lock().expect("lock poisoned");
            if config.force_read_fail {
                config.force_read_fail = false;
                return Err(CatalogError::Unreachable {
                    operation,
                    message: "simulated failure (forced)".into(),
                });
            }
            config.read_fail_rate
        };

        if self.should_inject_fault(rate) {
            return Err(CatalogError::Unreachable {
                operation,
                message: "simulated failure (random)".into(),
            });
        }
        Ok(())
    }

    fn check_write_fault(&self, operation: &'static str) -> CatalogResult<()> {
        let rate = {
            let mut config = self.fault_config.lock().expect("lock poisoned");
            if config.force_write_fail {
                config.force_write_fail = false;
                return Err(CatalogError::Unreachable {
                    operation,
                    message: "simulated failure (forced)".into(),
                });
            }
            config.write_fail_rate
        };

        if self.should_inject_fault(rate) {
            return Err(CatalogError::Unreachable {
                operation,
                message: "simulated failure (random)".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogManager for SimulatedCatalogManager {
    fn mode(&self) -> ConfigServerMode {
        self.mode
    }

    async fn get_balancer_settings(
        &self,
        _op: &OperationContext,
    ) -> CatalogResult<Option<BalancerSettings>> {
        self.check_read_fault("get_balancer_settings")?;

        let state = self.state.lock().expect("catalog lock poisoned");
        Ok(state.balancer)
    }

    async fn get_database(
        &self,
        _op: &OperationContext,
        name: &str,
    ) -> CatalogResult<Option<DatabaseType>> {
        self.check_read_fault("get_database")?;

        let state = self.state.lock().expect("catalog lock poisoned");
        Ok(state.databases.get(name).cloned())
    }

    async fn create_database(
        &self,
        op: &OperationContext,
        name: &str,
    ) -> CatalogResult<DatabaseType> {
        self.check_write_fault("create_database")?;

        let mut state = self.state.lock().expect("catalog lock poisoned");
        if state.databases.contains_key(name) {
            return Err(CatalogError::DatabaseExists {
                name: name.to_string(),
            });
        }

        // Least loaded non-draining shard; BTreeMap order breaks ties by id.
        let primary = state
            .shards
            .values()
            .filter(|shard| !shard.draining)
            .min_by_key(|shard| {
                state
                    .databases
                    .values()
                    .filter(|db| db.primary == shard.id)
                    .count()
            })
            .map(|shard| shard.id)
            .ok_or_else(|| CatalogError::NoShards {
                name: name.to_string(),
            })?;

        let database = DatabaseType {
            name: name.to_string(),
            primary,
            sharded: false,
        };
        state.databases.insert(name.to_string(), database.clone());

        // TigerStyle: Assert postcondition.
        assert!(state.databases.contains_key(name));
        debug!(op_id = %op.op_id(), database = name, primary = %primary, "Created database");
        Ok(database)
    }

    async fn get_all_shards(&self, _op: &OperationContext) -> CatalogResult<Vec<ShardType>> {
        self.check_read_fault("get_all_shards")?;

        let state = self.state.lock().expect("catalog lock poisoned");
        Ok(state.shards.values().cloned().collect())
    }

    async fn shut_down(&self) {
        let was_shut_down = self.shut_down.swap(true, Ordering::AcqRel);
        assert!(!was_shut_down, "catalog manager shut down twice");
        debug!(mode = %self.mode, "Catalog manager shut down");
    }
}
