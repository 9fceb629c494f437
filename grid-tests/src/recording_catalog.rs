//! Catalog manager that records its lifecycle into a shared event log.
//!
//! Used to check the ordering between guard releases and the retirement of a
//! swapped-out manager.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grid_catalog::{
    BalancerSettings, CatalogError, CatalogManager, CatalogResult, ConfigServerMode, DatabaseType,
    ShardType,
};
use grid_core::{Epoch, OperationContext, ShardId};

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A test released a guard that observed `manager` at `epoch`.
    GuardReleased {
        /// Manager the guard pointed at.
        manager: &'static str,
        /// Epoch the guard observed.
        epoch: Epoch,
    },
    /// `shut_down` ran on `manager`.
    ShutDown {
        /// Manager name.
        manager: &'static str,
    },
    /// `manager` was dropped.
    Dropped {
        /// Manager name.
        manager: &'static str,
    },
}

/// Append-only event log shared between a test and its managers.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<CatalogEvent>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends an event.
    ///
    /// # Panics
    ///
    /// Panics if the log lock is poisoned.
    pub fn record(&self, event: CatalogEvent) {
        self.events.lock().expect("lock poisoned").push(event);
    }

    /// Returns a copy of every event so far.
    ///
    /// # Panics
    ///
    /// Panics if the log lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CatalogEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Returns the index of the first event equal to `event`.
    #[must_use]
    pub fn position(&self, event: &CatalogEvent) -> Option<usize> {
        self.snapshot().iter().position(|e| e == event)
    }
}

/// Catalog manager with fixed metadata that logs `shut_down` and drop.
#[derive(Debug)]
pub struct RecordingCatalogManager {
    name: &'static str,
    mode: ConfigServerMode,
    log: Arc<EventLog>,
    balancer: Option<BalancerSettings>,
    fail_reads: AtomicBool,
}

impl RecordingCatalogManager {
    /// Creates a manager named `name` speaking `mode`.
    #[must_use]
    pub fn new(name: &'static str, mode: ConfigServerMode, log: &Arc<EventLog>) -> Self {
        Self {
            name,
            mode,
            log: Arc::clone(log),
            balancer: None,
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Builder: serve `settings` as the balancer document.
    #[must_use]
    pub fn with_balancer_settings(mut self, settings: BalancerSettings) -> Self {
        self.balancer = Some(settings);
        self
    }

    /// Builder: fail every read with `Unreachable`.
    #[must_use]
    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::Relaxed);
        self
    }

    /// Returns the manager name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn check_read(&self, operation: &'static str) -> CatalogResult<()> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(CatalogError::Unreachable {
                operation,
                message: format!("{} is offline", self.name),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogManager for RecordingCatalogManager {
    fn mode(&self) -> ConfigServerMode {
        self.mode
    }

    async fn get_balancer_settings(
        &self,
        _op: &OperationContext,
    ) -> CatalogResult<Option<BalancerSettings>> {
        self.check_read("get_balancer_settings")?;
        Ok(self.balancer)
    }

    async fn get_database(
        &self,
        _op: &OperationContext,
        _name: &str,
    ) -> CatalogResult<Option<DatabaseType>> {
        self.check_read("get_database")?;
        Ok(None)
    }

    async fn create_database(
        &self,
        _op: &OperationContext,
        name: &str,
    ) -> CatalogResult<DatabaseType> {
        Ok(DatabaseType {
            name: name.to_string(),
            primary: ShardId::new(1),
            sharded: false,
        })
    }

    async fn get_all_shards(&self, _op: &OperationContext) -> CatalogResult<Vec<ShardType>> {
        self.check_read("get_all_shards")?;
        Ok(Vec::new())
    }

    async fn shut_down(&self) {
        self.log.record(CatalogEvent::ShutDown { manager: self.name });
    }
}

impl Drop for RecordingCatalogManager {
    fn drop(&mut self) {
        self.log.record(CatalogEvent::Dropped { manager: self.name });
    }
}
