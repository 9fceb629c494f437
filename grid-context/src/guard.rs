//! Scoped access to the active catalog manager.

use std::fmt;
use std::ops::Deref;

use grid_catalog::CatalogManager;
use grid_core::Epoch;

use crate::swap_cell::SwapGuard;

/// Proof that the caller holds a live reference to the active catalog manager.
///
/// Only [`SharedContext::access_catalog_manager`](crate::SharedContext::access_catalog_manager)
/// hands these out. While a guard is alive the manager it derefs to cannot be
/// swapped out or dropped; dropping the guard (on any exit path) releases the
/// hold. Guards move but do not clone, and they borrow the context, so they
/// cannot outlive it.
///
/// Keep a guard for one logical operation. Holding one indefinitely blocks
/// the config server migration.
///
/// # Deadlocks
///
/// While a task holds a guard it must not ask the context for the catalog
/// manager again: not through `access_catalog_manager`, not through
/// `check_if_catalog_needs_swapping`, and not through any helper that takes a
/// guard internally. If a swap is queued, the swap waits for this guard and
/// the second request waits for the swap. Pass this guard to the `*_with`
/// helpers on [`SharedContext`](crate::SharedContext) instead.
pub struct CatalogManagerGuard<'a> {
    inner: SwapGuard<'a, Box<dyn CatalogManager>>,
}

impl<'a> CatalogManagerGuard<'a> {
    pub(crate) fn new(inner: SwapGuard<'a, Box<dyn CatalogManager>>) -> Self {
        Self { inner }
    }

    /// Returns the epoch of the pinned manager.
    ///
    /// The epoch increases by one with every swap.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.inner.epoch()
    }

    /// Returns the pinned manager.
    #[must_use]
    pub fn get(&self) -> &dyn CatalogManager {
        &**self.inner
    }
}

impl Deref for CatalogManagerGuard<'_> {
    type Target = dyn CatalogManager;

    fn deref(&self) -> &Self::Target {
        &**self.inner
    }
}

impl fmt::Debug for CatalogManagerGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogManagerGuard")
            .field("epoch", &self.epoch())
            .field("mode", &self.get().mode())
            .finish()
    }
}
