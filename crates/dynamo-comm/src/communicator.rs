//! The [`Communicator`] trait.

use dynamo_core::Rank;

use crate::error::CommError;

/// A member of a fixed-size process group.
///
/// # Contract
///
/// - `rank()` and `size()` never change after construction.
/// - Collectives are blocking and must be entered by **every** rank in
///   the same order with buffers of the same length. A rank that never
///   arrives stalls the group; backends may report a vanished peer as
///   [`CommError::PeerDisconnected`] but no timeout is implied.
/// - `all_reduce_sum` leaves identical contents in every rank's buffer.
///
/// `Send` so an endpoint can be moved onto the thread (or process) that
/// drives its rank.
pub trait Communicator: Send {
    /// This endpoint's rank, in `0..size()`.
    fn rank(&self) -> Rank;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Replace `buf` on every rank with the elementwise sum over ranks.
    fn all_reduce_sum(&mut self, buf: &mut [f64]) -> Result<(), CommError>;

    /// Block until every rank has arrived.
    fn barrier(&mut self) -> Result<(), CommError> {
        self.all_reduce_sum(&mut [])
    }

    /// Whether this endpoint is the root (rank 0).
    fn is_root(&self) -> bool {
        self.rank().is_root()
    }
}

impl<C: Communicator + ?Sized> Communicator for Box<C> {
    fn rank(&self) -> Rank {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn all_reduce_sum(&mut self, buf: &mut [f64]) -> Result<(), CommError> {
        (**self).all_reduce_sum(buf)
    }

    fn barrier(&mut self) -> Result<(), CommError> {
        (**self).barrier()
    }
}
