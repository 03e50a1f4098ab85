//! # Process-unique module identities.
//!
//! Every module instantiation allocates one [`ModuleId`] from a global
//! monotonic counter. Identities are never reused, so two registries in the
//! same process (parallel tests, several applications) can never confuse each
//! other's modules.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global counter for identity allocation.
static MODULE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique module identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u64);

impl ModuleId {
    /// Allocates a fresh identity.
    pub fn next() -> Self {
        Self(MODULE_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw numeric value (for logs and debug output).
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_are_unique_and_increasing() {
        let a = ModuleId::next();
        let b = ModuleId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
