//! Error types for ownership and profile construction.

use std::error::Error;
use std::fmt;

/// Errors from [`RadialOwnership::new`](crate::RadialOwnership::new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnershipError {
    /// The process group has zero members.
    EmptyGroup,
    /// The calling rank is not a member of the group.
    RankOutOfRange {
        /// The offending rank.
        rank: u32,
        /// Size of the process group.
        size: usize,
    },
}

impl fmt::Display for OwnershipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGroup => write!(f, "process group must have at least one rank"),
            Self::RankOutOfRange { rank, size } => {
                write!(f, "rank {rank} out of range for group of size {size}")
            }
        }
    }
}

impl Error for OwnershipError {}

/// Errors from building or evaluating a per-shell profile.
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileError {
    /// The output buffer does not cover every shell.
    LengthMismatch {
        /// Number of shells in the grid.
        expected: usize,
        /// Length of the buffer supplied.
        found: usize,
    },
    /// The base value is NaN or infinite.
    NonFiniteBase {
        /// The rejected value.
        value: f64,
    },
    /// A smooth transition width is not finite and positive.
    InvalidWidth {
        /// The rejected width.
        value: f64,
    },
    /// A tabulated profile's table length differs from the shell count.
    TableLength {
        /// Number of shells in the grid.
        expected: usize,
        /// Number of table entries.
        found: usize,
    },
    /// Variable truncation parameters are invalid.
    InvalidTruncation {
        /// Which parameter and why.
        reason: String,
    },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, found } => {
                write!(f, "profile buffer has {found} entries, grid has {expected} shells")
            }
            Self::NonFiniteBase { value } => {
                write!(f, "base value must be finite, got {value}")
            }
            Self::InvalidWidth { value } => {
                write!(f, "transition width must be finite and positive, got {value}")
            }
            Self::TableLength { expected, found } => {
                write!(f, "profile table has {found} entries, grid has {expected} shells")
            }
            Self::InvalidTruncation { reason } => {
                write!(f, "invalid variable truncation: {reason}")
            }
        }
    }
}

impl Error for ProfileError {}
