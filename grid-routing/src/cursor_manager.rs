//! Cluster cursor manager - router-side cursors for multi-shard queries.
//!
//! A cursor is registered when a query returns its first batch and lives
//! until it is exhausted, killed, or reaped for idleness. While a request is
//! fetching the next batch the cursor is checked out (pinned) so no second
//! request can use it concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use grid_core::{CursorId, Limits};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{RoutingError, RoutingResult};

/// Configuration for the cursor manager.
#[derive(Debug, Clone, Copy)]
pub struct CursorManagerConfig {
    /// Maximum number of open cursors.
    pub max_cursors: usize,
    /// Idle time after which an unpinned cursor is reaped, in microseconds.
    pub idle_timeout_us: u64,
}

impl CursorManagerConfig {
    /// Creates config from system limits.
    #[must_use]
    pub const fn from_limits(limits: &Limits) -> Self {
        Self {
            max_cursors: limits.max_cursors as usize,
            idle_timeout_us: limits.cursor_idle_timeout_us,
        }
    }

    /// Creates config for testing with small limits.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_cursors: 16,
            idle_timeout_us: 1_000_000,
        }
    }
}

impl Default for CursorManagerConfig {
    fn default() -> Self {
        Self::from_limits(&Limits::new())
    }
}

/// Snapshot of cursor table occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorStats {
    /// Open cursors, pinned or not.
    pub open: usize,
    /// Cursors currently checked out.
    pub pinned: usize,
}

#[derive(Debug)]
struct CursorEntry {
    namespace: String,
    pinned: bool,
    last_active_us: u64,
}

/// Table of open router cursors.
#[derive(Debug)]
pub struct ClusterCursorManager {
    config: CursorManagerConfig,
    cursors: Mutex<HashMap<CursorId, CursorEntry>>,
    /// Cursor ID generator (monotonic).
    next_cursor_id: AtomicU64,
}

impl ClusterCursorManager {
    /// Creates an empty cursor manager.
    #[must_use]
    pub fn new(config: CursorManagerConfig) -> Self {
        Self {
            config,
            cursors: Mutex::new(HashMap::new()),
            next_cursor_id: AtomicU64::new(1),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CursorManagerConfig {
        &self.config
    }

    /// Registers a new idle cursor over `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `TooManyCursors` if the table is full.
    pub async fn register_cursor(
        &self,
        namespace: impl Into<String>,
        current_time_us: u64,
    ) -> RoutingResult<CursorId> {
        let mut cursors = self.cursors.lock().await;
        if cursors.len() >= self.config.max_cursors {
            return Err(RoutingError::TooManyCursors {
                count: cursors.len(),
                max: self.config.max_cursors,
            });
        }

        let cursor_id = CursorId::new(self.next_cursor_id.fetch_add(1, Ordering::Relaxed));
        let namespace = namespace.into();
        debug!(cursor_id = %cursor_id, namespace = %namespace, "Registered cursor");
        cursors.insert(
            cursor_id,
            CursorEntry {
                namespace,
                pinned: false,
                last_active_us: current_time_us,
            },
        );
        Ok(cursor_id)
    }

    /// Pins a cursor for one batch and returns its namespace.
    ///
    /// # Errors
    ///
    /// Returns `CursorNotFound` if the cursor does not exist and
    /// `CursorInUse` if it is already pinned.
    pub async fn check_out(
        &self,
        cursor_id: CursorId,
        current_time_us: u64,
    ) -> RoutingResult<String> {
        let mut cursors = self.cursors.lock().await;
        let entry = cursors
            .get_mut(&cursor_id)
            .ok_or(RoutingError::CursorNotFound { cursor_id })?;
        if entry.pinned {
            return Err(RoutingError::CursorInUse { cursor_id });
        }

        entry.pinned = true;
        entry.last_active_us = current_time_us;
        Ok(entry.namespace.clone())
    }

    /// Unpins a cursor. An exhausted cursor is removed.
    ///
    /// # Errors
    ///
    /// Returns `CursorNotFound` if the cursor does not exist and
    /// `CursorNotPinned` if it was not checked out.
    pub async fn check_in(
        &self,
        cursor_id: CursorId,
        current_time_us: u64,
        exhausted: bool,
    ) -> RoutingResult<()> {
        let mut cursors = self.cursors.lock().await;
        let entry = cursors
            .get_mut(&cursor_id)
            .ok_or(RoutingError::CursorNotFound { cursor_id })?;
        if !entry.pinned {
            return Err(RoutingError::CursorNotPinned { cursor_id });
        }

        if exhausted {
            cursors.remove(&cursor_id);
            debug!(cursor_id = %cursor_id, "Cursor exhausted");
        } else {
            entry.pinned = false;
            entry.last_active_us = current_time_us;
        }
        Ok(())
    }

    /// Kills an idle cursor.
    ///
    /// # Errors
    ///
    /// Returns `CursorNotFound` if the cursor does not exist and
    /// `CursorInUse` if it is pinned.
    pub async fn kill_cursor(&self, cursor_id: CursorId) -> RoutingResult<()> {
        let mut cursors = self.cursors.lock().await;
        let pinned = cursors
            .get(&cursor_id)
            .ok_or(RoutingError::CursorNotFound { cursor_id })?
            .pinned;
        if pinned {
            return Err(RoutingError::CursorInUse { cursor_id });
        }

        cursors.remove(&cursor_id);
        debug!(cursor_id = %cursor_id, "Killed cursor");
        Ok(())
    }

    /// Reaps unpinned cursors idle longer than the configured timeout.
    ///
    /// Returns the number of cursors reaped.
    pub async fn kill_idle_cursors(&self, current_time_us: u64) -> usize {
        let mut cursors = self.cursors.lock().await;
        let before = cursors.len();
        let idle_timeout_us = self.config.idle_timeout_us;
        cursors.retain(|_, entry| {
            entry.pinned || current_time_us.saturating_sub(entry.last_active_us) <= idle_timeout_us
        });

        let reaped = before - cursors.len();
        if reaped > 0 {
            info!(reaped, remaining = cursors.len(), "Reaped idle cursors");
        }
        reaped
    }

    /// Returns open and pinned cursor counts.
    pub async fn stats(&self) -> CursorStats {
        let cursors = self.cursors.lock().await;
        CursorStats {
            open: cursors.len(),
            pinned: cursors.values().filter(|entry| entry.pinned).count(),
        }
    }
}

impl Default for ClusterCursorManager {
    fn default() -> Self {
        Self::new(CursorManagerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ClusterCursorManager {
        ClusterCursorManager::new(CursorManagerConfig::for_testing())
    }

    #[tokio::test]
    async fn test_cursor_lifecycle() {
        let manager = manager();
        let id = manager.register_cursor("shop.orders", 0).await.unwrap();
        assert_eq!(id, CursorId::new(1));

        let ns = manager.check_out(id, 10).await.unwrap();
        assert_eq!(ns, "shop.orders");
        assert_eq!(manager.stats().await, CursorStats { open: 1, pinned: 1 });

        manager.check_in(id, 20, false).await.unwrap();
        assert_eq!(manager.stats().await, CursorStats { open: 1, pinned: 0 });

        manager.check_out(id, 30).await.unwrap();
        manager.check_in(id, 40, true).await.unwrap();
        assert_eq!(manager.stats().await, CursorStats::default());
    }

    #[tokio::test]
    async fn test_double_check_out_rejected() {
        let manager = manager();
        let id = manager.register_cursor("shop.orders", 0).await.unwrap();
        manager.check_out(id, 1).await.unwrap();

        let err = manager.check_out(id, 2).await.unwrap_err();
        assert_eq!(err, RoutingError::CursorInUse { cursor_id: id });

        let err = manager.kill_cursor(id).await.unwrap_err();
        assert_eq!(err, RoutingError::CursorInUse { cursor_id: id });
    }

    #[tokio::test]
    async fn test_check_in_requires_check_out() {
        let manager = manager();
        let id = manager.register_cursor("shop.orders", 0).await.unwrap();

        let err = manager.check_in(id, 1, false).await.unwrap_err();
        assert_eq!(err, RoutingError::CursorNotPinned { cursor_id: id });

        let err = manager.check_in(CursorId::new(99), 1, false).await.unwrap_err();
        assert_eq!(
            err,
            RoutingError::CursorNotFound {
                cursor_id: CursorId::new(99)
            }
        );
    }

    #[tokio::test]
    async fn test_capacity() {
        let manager = ClusterCursorManager::new(CursorManagerConfig {
            max_cursors: 1,
            idle_timeout_us: 1_000,
        });
        let id = manager.register_cursor("a.b", 0).await.unwrap();
        assert!(matches!(
            manager.register_cursor("a.b", 0).await,
            Err(RoutingError::TooManyCursors { count: 1, max: 1 })
        ));

        manager.kill_cursor(id).await.unwrap();
        assert!(manager.register_cursor("a.b", 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_idle_reaping_skips_pinned() {
        let manager = manager();
        let idle = manager.register_cursor("a.idle", 0).await.unwrap();
        let pinned = manager.register_cursor("a.pinned", 0).await.unwrap();
        let fresh = manager.register_cursor("a.fresh", 900_000).await.unwrap();
        manager.check_out(pinned, 0).await.unwrap();

        // Timeout is 1s; at 1.5s only `idle` is past it and unpinned.
        let reaped = manager.kill_idle_cursors(1_500_000).await;
        assert_eq!(reaped, 1);
        assert!(matches!(
            manager.check_out(idle, 1_500_000).await,
            Err(RoutingError::CursorNotFound { .. })
        ));
        assert!(manager.check_out(fresh, 1_500_000).await.is_ok());
        assert_eq!(manager.stats().await.open, 2);
    }
}
