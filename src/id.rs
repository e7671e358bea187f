//! Arena handles for every interned entity.
//!
//! All stores hand out small integer handles instead of references, so
//! components pass `Copy` ids around and never hold on to each other's data.
//! Each handle wraps a `NonZeroU64` so `Option<Id>` costs nothing extra.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Create a handle from a raw `u64`. Returns `None` for zero.
            pub fn new(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map($name)
            }

            /// Get the underlying `u64` value.
            pub fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl From<NonZeroU64> for $name {
            fn from(raw: NonZeroU64) -> Self {
                $name(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A normalized word in the vocabulary.
    TokenId,
    "tok"
);
define_id!(
    /// A distinct sentence (ordered token sequence).
    SentenceId,
    "sen"
);
define_id!(
    /// A distinct unordered pair of tokens.
    PairId,
    "pair"
);
define_id!(
    /// A contiguous sentence fragment of three or more tokens.
    ChainId,
    "chain"
);
define_id!(
    /// One accepted document.
    PhraseId,
    "phr"
);
define_id!(
    /// A discovered orthotope.
    OrthoId,
    "ortho"
);

/// Thread-safe handle allocator.
///
/// Produces monotonically increasing ids starting from 1. `reset` rewinds
/// it; callers must guarantee no stale handle outlives the reset.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next handle.
    pub fn next<T: From<NonZeroU64>>(&self) -> T {
        let n = self.issued.fetch_add(1, Ordering::Relaxed);
        T::from(NonZeroU64::MIN.saturating_add(n))
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.issued.store(0, Ordering::Relaxed);
    }
}
