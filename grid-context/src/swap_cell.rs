//! Versioned hot-swappable cell.
//!
//! `SwapCell` pairs two primitives over one value:
//!
//! - A reader/writer lock. Readers hold it shared for the lifetime of a
//!   [`SwapGuard`]; a replacement holds it exclusively.
//! - A writer mutex. It serializes replacements end to end, including any
//!   inspection the writer does before deciding to replace.
//!
//! To read the value, hold the lock shared or hold the writer mutex (via
//! [`SwapWriter::peek`]). To replace it, hold both the writer mutex and the
//! lock exclusively.
//!
//! Tokio's `RwLock` is fair: once a writer is queued, readers that arrive
//! after it wait behind it. A replacement therefore waits only for readers
//! that were admitted before it queued, never for an unbounded stream of
//! new ones.

use std::fmt;
use std::ops::Deref;

use grid_core::Epoch;
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Value plus the generation it was installed in.
#[derive(Debug)]
struct Slot<T> {
    value: T,
    epoch: Epoch,
}

/// A value that many readers can pin and one writer at a time can replace.
#[derive(Debug)]
pub struct SwapCell<T> {
    slot: RwLock<Slot<T>>,
    writer: Mutex<()>,
}

impl<T> SwapCell<T> {
    /// Creates a cell holding `value` at epoch 1.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            slot: RwLock::new(Slot {
                value,
                epoch: Epoch::new(1),
            }),
            writer: Mutex::new(()),
        }
    }

    /// Waits for shared admission and returns a guard pinning the current value.
    ///
    /// Waits only while a replacement is queued or in progress.
    pub async fn read(&self) -> SwapGuard<'_, T> {
        SwapGuard {
            slot: self.slot.read().await,
        }
    }

    /// Waits for the writer mutex.
    ///
    /// Readers are not blocked until the returned writer calls
    /// [`SwapWriter::replace`].
    pub async fn lock_writer(&self) -> SwapWriter<'_, T> {
        SwapWriter {
            cell: self,
            _serial: self.writer.lock().await,
        }
    }

    /// Replaces the value unconditionally.
    ///
    /// Returns the previous value and the new epoch.
    pub async fn swap(&self, value: T) -> (T, Epoch) {
        self.lock_writer().await.replace(value).await
    }

    /// Consumes the cell and returns the current value.
    pub fn into_inner(self) -> T {
        self.slot.into_inner().value
    }
}

/// Shared admission to a [`SwapCell`].
///
/// While any guard is alive the value it points at cannot be replaced or
/// dropped. Guards can be moved but not cloned.
pub struct SwapGuard<'a, T> {
    slot: RwLockReadGuard<'a, Slot<T>>,
}

impl<T> SwapGuard<'_, T> {
    /// Returns the epoch of the pinned value.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.slot.epoch
    }
}

impl<T> Deref for SwapGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.slot.value
    }
}

impl<T: fmt::Debug> fmt::Debug for SwapGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapGuard")
            .field("epoch", &self.slot.epoch)
            .field("value", &self.slot.value)
            .finish()
    }
}

/// Exclusive right to replace the value of a [`SwapCell`].
///
/// Holding a writer does not block readers; only [`Self::replace`] does, and
/// only for the duration of the replacement.
pub struct SwapWriter<'a, T> {
    cell: &'a SwapCell<T>,
    _serial: MutexGuard<'a, ()>,
}

impl<'a, T> SwapWriter<'a, T> {
    /// Inspects the current value and its epoch.
    ///
    /// The value cannot change between a `peek` and a later `replace` on the
    /// same writer.
    pub async fn peek<R>(&self, f: impl FnOnce(&T, Epoch) -> R) -> R {
        let slot = self.cell.slot.read().await;
        f(&slot.value, slot.epoch)
    }

    /// Replaces the value, waiting for every outstanding guard to drop.
    ///
    /// Returns the previous value and the new epoch. Both locks are released
    /// before this returns, so the caller drops the previous value outside of
    /// any lock.
    ///
    /// `value` is owned by the returned future; if the future is dropped
    /// while waiting, `value` is dropped with it. Use [`Self::exclusive`] to
    /// keep ownership until admission is granted.
    pub async fn replace(self, value: T) -> (T, Epoch) {
        self.exclusive().await.install(value)
    }

    /// Waits for every outstanding guard to drop and takes the lock exclusively.
    ///
    /// New readers queue behind this call from the moment it starts waiting.
    #[allow(clippy::used_underscore_binding)]
    pub async fn exclusive(self) -> SwapExclusive<'a, T> {
        let cell = self.cell;
        let slot = cell.slot.write().await;
        SwapExclusive {
            slot,
            _serial: self._serial,
        }
    }
}

/// Exclusive admission to a [`SwapCell`], holding both the lock and the writer mutex.
pub struct SwapExclusive<'a, T> {
    slot: RwLockWriteGuard<'a, Slot<T>>,
    _serial: MutexGuard<'a, ()>,
}

impl<T> SwapExclusive<'_, T> {
    /// Returns the epoch of the current value.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.slot.epoch
    }

    /// Installs `value`, bumps the epoch and releases both locks.
    ///
    /// Returns the previous value and the new epoch.
    pub fn install(mut self, value: T) -> (T, Epoch) {
        let previous = std::mem::replace(&mut self.slot.value, value);
        self.slot.epoch = self.slot.epoch.next();
        let epoch = self.slot.epoch;

        // Lock and writer mutex are released when `self` drops here.
        (previous, epoch)
    }
}

impl<T> fmt::Debug for SwapExclusive<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapExclusive")
            .field("epoch", &self.slot.epoch)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for SwapWriter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapWriter").finish_non_exhaustive()
    }
}
