//! Strongly-typed identifiers for process ranks and diagnostic cycles.

use std::fmt;

/// Identifies a process within the cooperating process group.
///
/// `Rank(0)` is the root: the designated diagnostic-log writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub u32);

impl Rank {
    /// The root rank, which owns the diagnostic log.
    pub const ROOT: Rank = Rank(0);

    /// Whether this is the root rank.
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    /// The rank as a `usize` index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing diagnostic-cycle counter.
///
/// Incremented once per completed (or abandoned) aggregation cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleId(pub u64);

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CycleId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_rank_is_zero() {
        assert!(Rank(0).is_root());
        assert!(!Rank(3).is_root());
        assert_eq!(Rank::ROOT, Rank::from(0));
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(Rank(7).to_string(), "7");
        assert_eq!(CycleId(42).to_string(), "42");
    }
}
