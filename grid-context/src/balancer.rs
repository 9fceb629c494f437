//! Balancer enablement predicate.

use grid_catalog::{minute_of_day, BalancerSettings};

/// Returns true if `settings` allow the balancer to run at `current_time_us`.
///
/// An explicit stop always wins. Otherwise an active window, if set, limits
/// balancing to the window (evaluated on the UTC minute of day).
#[must_use]
pub fn should_balance(settings: &BalancerSettings, current_time_us: u64) -> bool {
    if let Some(true) = settings.stopped {
        return false;
    }
    match settings.active_window {
        Some(window) => window.contains(minute_of_day(current_time_us)),
        None => true,
    }
}
