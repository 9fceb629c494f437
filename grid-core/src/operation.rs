//! Per-operation context handle.

use crate::types::OpId;

/// Handle for one logical operation.
///
/// Every catalog call takes one of these so logs and spans can be tied back
/// to the operation that issued them. Time is carried explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationContext {
    op_id: OpId,
    started_at_us: u64,
}

impl OperationContext {
    /// Creates a context for an operation that started at `started_at_us`.
    #[must_use]
    pub const fn new(op_id: OpId, started_at_us: u64) -> Self {
        Self {
            op_id,
            started_at_us,
        }
    }

    /// Returns the operation identifier.
    #[must_use]
    pub const fn op_id(&self) -> OpId {
        self.op_id
    }

    /// Returns when the operation started, in microseconds since the epoch.
    #[must_use]
    pub const fn started_at_us(&self) -> u64 {
        self.started_at_us
    }

    /// Returns how long the operation has been running at `current_time_us`.
    #[must_use]
    pub const fn elapsed_us(&self, current_time_us: u64) -> u64 {
        current_time_us.saturating_sub(self.started_at_us)
    }
}
