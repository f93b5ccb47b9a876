//! Error types for collective operations.

use std::error::Error;
use std::fmt;

/// Errors from a collective operation.
///
/// Whenever the root detects a problem it reports the same error to
/// every surviving rank, so the group fails together instead of some
/// ranks proceeding while others are stuck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// A rank contributed a buffer of a different length than the root.
    ShapeMismatch {
        /// The first rank whose buffer differed.
        rank: u32,
        /// Length of the root's buffer.
        expected: usize,
        /// Length of the offending buffer.
        found: usize,
    },
    /// A rank's endpoint was dropped before it reached the collective.
    PeerDisconnected {
        /// The first missing rank.
        rank: u32,
    },
    /// The root's endpoint was dropped.
    RootDisconnected,
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                rank,
                expected,
                found,
            } => write!(
                f,
                "rank {rank} contributed {found} values, expected {expected}"
            ),
            Self::PeerDisconnected { rank } => {
                write!(f, "rank {rank} left the group before the collective")
            }
            Self::RootDisconnected => write!(f, "root rank left the group"),
        }
    }
}

impl Error for CommError {}
