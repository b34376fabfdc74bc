//! Unique identifiers for views and rendered elements.
use serde::Serialize;
use std::{
    fmt,
    num::NonZeroU64,
    sync::atomic::{AtomicU64, Ordering},
};

/// An incrementing counter for generating unique ids.
///
/// The counter saturates instead of wrapping: after 2^64 - 1 ids all further ids are equal.
struct Counter(AtomicU64);

impl Counter {
    const fn new() -> Counter {
        Counter(AtomicU64::new(0))
    }

    fn next_nonzero(&self) -> NonZeroU64 {
        NonZeroU64::MIN.saturating_add(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $counter:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        static $counter: Counter = Counter::new();

        impl $name {
            /// Allocates a new unique ID.
            pub fn next() -> $name {
                $name($counter.next_nonzero())
            }

            /// Converts the ID to a `u64` value.
            pub fn to_u64(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{:08X}", self.to_u64())
            }
        }
    };
}

define_id!(
    /// Identifies a view instance for its whole lifetime.
    ///
    /// Reused views (moved within a list) keep their ID.
    ViewId,
    VIEW_ID_COUNTER
);

define_id!(
    /// Identifies a rendered element created by the host toolkit.
    ElementId,
    ELEMENT_ID_COUNTER
);
