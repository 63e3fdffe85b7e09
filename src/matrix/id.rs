//! Matrix handle identifiers

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for unique handle IDs
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a matrix handle
///
/// Views record the id of the owning handle at the root of their chain, so
/// diagnostics can name whose storage a view borrows. IDs are unique within a
/// process lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatrixId(u64);

impl MatrixId {
    /// Create a new unique matrix ID
    #[inline]
    pub fn new() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for MatrixId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MatrixId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Matrix({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids() {
        let id1 = MatrixId::new();
        let id2 = MatrixId::new();
        assert_ne!(id1, id2);
        assert!(id2.raw() > id1.raw());
    }
}
