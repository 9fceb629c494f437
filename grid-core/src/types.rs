//! Strongly-typed identifiers for grid entities.
//!
//! Following `TigerStyle`: explicit types prevent bugs from mixing up IDs.
//! All IDs are 64-bit.

use std::fmt;

/// Macro to generate strongly-typed ID wrappers.
///
/// Each ID type wraps a u64 and provides:
/// - Type safety (can't mix `ShardId` with `CursorId`)
/// - Debug/Display formatting
/// - Zero-cost abstraction (same as raw u64)
macro_rules! define_id {
    ($name:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new ID from a raw u64 value.
            #[inline]
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw u64 value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Returns the next ID in sequence.
            ///
            /// # Panics
            /// Panics if the ID would overflow.
            #[inline]
            #[must_use]
            pub const fn next(self) -> Self {
                assert!(self.0 < u64::MAX, "ID overflow");
                Self(self.0 + 1)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.get()
            }
        }
    };
}

// Operations.
define_id!(OpId, "op", "Unique identifier for a logical operation on this node.");

// Cluster topology.
define_id!(ShardId, "shard", "Unique identifier for a shard in the cluster.");

// Query.
define_id!(CursorId, "cursor", "Unique identifier for a router-side cluster cursor.");

// Catalog manager generations.
define_id!(Epoch, "epoch", "Generation of the active catalog manager; bumped by every swap.");
