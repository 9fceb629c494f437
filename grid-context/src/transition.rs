//! Catalog manager mode transitions.

use grid_catalog::ConfigServerMode;
use grid_core::Epoch;

use crate::error::{ContextError, ContextResult};

/// Result of a compatibility check against the active catalog manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDecision {
    /// The active manager already speaks the desired protocol.
    AlreadyInMode,
    /// The active manager must be swapped for one in the desired mode.
    SwapRequired,
}

/// Result of a swap attempt that passed the compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Nothing was replaced; the offered manager was discarded.
    AlreadyInMode {
        /// Mode of the active manager.
        mode: ConfigServerMode,
        /// Epoch of the active manager.
        epoch: Epoch,
    },
    /// The active manager was replaced.
    Swapped {
        /// Mode of the retired manager.
        from: ConfigServerMode,
        /// Mode of the newly active manager.
        to: ConfigServerMode,
        /// Epoch of the newly active manager.
        epoch: Epoch,
    },
}

/// Decides whether moving from `current` to `desired` is allowed.
///
/// # Errors
///
/// Returns `IncompatibleCatalogManager` for a consensus to legacy downgrade.
pub fn evaluate_transition(
    current: ConfigServerMode,
    desired: ConfigServerMode,
) -> ContextResult<SwapDecision> {
    match (current, desired) {
        (ConfigServerMode::Legacy, ConfigServerMode::Legacy)
        | (ConfigServerMode::Consensus, ConfigServerMode::Consensus) => {
            Ok(SwapDecision::AlreadyInMode)
        }
        (ConfigServerMode::Legacy, ConfigServerMode::Consensus) => Ok(SwapDecision::SwapRequired),
        (ConfigServerMode::Consensus, ConfigServerMode::Legacy) => {
            Err(ContextError::IncompatibleCatalogManager { current, desired })
        }
    }
}
