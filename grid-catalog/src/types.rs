//! Catalog metadata types.

use std::fmt;
use std::str::FromStr;

use grid_core::ShardId;

use crate::error::{CatalogError, CatalogResult};

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Microseconds in a minute.
const MINUTE_US: u64 = 60 * 1_000_000;

/// Returns the UTC minute of day for a timestamp in microseconds since the epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Bounded by MINUTES_PER_DAY.
pub const fn minute_of_day(current_time_us: u64) -> u16 {
    ((current_time_us / MINUTE_US) % MINUTES_PER_DAY as u64) as u16
}

// -----------------------------------------------------------------------------
// Config Server Mode
// -----------------------------------------------------------------------------

/// Protocol used to talk to the config servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigServerMode {
    /// Three mirrored config servers, no consensus (`SCCC`).
    Legacy,
    /// Replicated config server set (`CSRS`).
    Consensus,
}

impl fmt::Display for ConfigServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "SCCC"),
            Self::Consensus => write!(f, "CSRS"),
        }
    }
}

// -----------------------------------------------------------------------------
// Balancer Settings
// -----------------------------------------------------------------------------

/// Daily window during which the balancer may run.
///
/// Minutes are counted from UTC midnight. Both ends are inclusive. A window
/// whose stop precedes its start wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    start_minute: u16,
    stop_minute: u16,
}

impl ActiveWindow {
    /// Creates a window from minute-of-day bounds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` if either bound is out of range or both are equal.
    pub fn new(start_minute: u16, stop_minute: u16) -> CatalogResult<Self> {
        if start_minute >= MINUTES_PER_DAY || stop_minute >= MINUTES_PER_DAY {
            return Err(CatalogError::InvalidWindow {
                value: format!("{start_minute}-{stop_minute}"),
                reason: "minute out of range",
            });
        }
        if start_minute == stop_minute {
            return Err(CatalogError::InvalidWindow {
                value: format!("{start_minute}-{stop_minute}"),
                reason: "start and stop must differ",
            });
        }
        Ok(Self {
            start_minute,
            stop_minute,
        })
    }

    /// Parses a window from `"HH:MM"` start and stop strings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` if either string is malformed.
    pub fn parse(start: &str, stop: &str) -> CatalogResult<Self> {
        Self::new(parse_hh_mm(start)?, parse_hh_mm(stop)?)
    }

    /// Returns the start minute of day.
    #[must_use]
    pub const fn start_minute(&self) -> u16 {
        self.start_minute
    }

    /// Returns the stop minute of day.
    #[must_use]
    pub const fn stop_minute(&self) -> u16 {
        self.stop_minute
    }

    /// Returns true if `minute` falls within the window.
    #[must_use]
    pub const fn contains(&self, minute: u16) -> bool {
        if self.start_minute < self.stop_minute {
            minute >= self.start_minute && minute <= self.stop_minute
        } else {
            // Overnight.
            minute >= self.start_minute || minute <= self.stop_minute
        }
    }
}

fn parse_hh_mm(value: &str) -> CatalogResult<u16> {
    let invalid = |reason| CatalogError::InvalidWindow {
        value: value.to_string(),
        reason,
    };

    let (hours, minutes) = value.split_once(':').ok_or_else(|| invalid("expected HH:MM"))?;
    let hours = u16::from_str(hours).map_err(|_| invalid("hours are not a number"))?;
    let minutes = u16::from_str(minutes).map_err(|_| invalid("minutes are not a number"))?;
    if hours >= 24 {
        return Err(invalid("hours must be < 24"));
    }
    if minutes >= 60 {
        return Err(invalid("minutes must be < 60"));
    }
    Ok(hours * 60 + minutes)
}

/// The balancer settings document stored in the catalog.
///
/// Every field is optional; an unset field leaves the default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalancerSettings {
    /// Explicit stop flag.
    pub stopped: Option<bool>,
    /// Restricts balancing to a daily window.
    pub active_window: Option<ActiveWindow>,
}

impl BalancerSettings {
    /// Settings with the balancer explicitly stopped.
    #[must_use]
    pub const fn stopped() -> Self {
        Self {
            stopped: Some(true),
            active_window: None,
        }
    }

    /// Builder: restrict balancing to a window.
    #[must_use]
    pub const fn with_active_window(mut self, window: ActiveWindow) -> Self {
        self.active_window = Some(window);
        self
    }
}

// -----------------------------------------------------------------------------
// Databases and Shards
// -----------------------------------------------------------------------------

/// Catalog entry for a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseType {
    /// Database name.
    pub name: String,
    /// Shard holding the database's unsharded collections.
    pub primary: ShardId,
    /// Whether sharding is enabled for the database.
    pub sharded: bool,
}

/// Catalog entry for a shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardType {
    /// Shard identifier.
    pub id: ShardId,
    /// Connection host (`host:port`).
    pub host: String,
    /// Whether the shard is being drained for removal.
    pub draining: bool,
}

impl ShardType {
    /// Creates a non-draining shard entry.
    #[must_use]
    pub fn new(id: ShardId, host: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
            draining: false,
        }
    }
}
