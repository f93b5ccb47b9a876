//! Balanced contiguous partition of radial shells across ranks.

use std::ops::Range;

use dynamo_core::{RadialGrid, Rank};

use crate::error::OwnershipError;

/// Which rank owns which radial shell.
///
/// Shells are split into `size` contiguous ranges in rank order. With
/// `base = NR / size` and `extra = NR % size`, ranks `0..extra` own
/// `base + 1` shells and the remaining ranks own `base`. The remainder
/// therefore always goes to the lowest ranks, and every process derives
/// the identical partition from `(grid, size)` alone.
///
/// When `size > NR` the highest ranks own empty ranges. They still take
/// part in every collective reduction, contributing zeros.
///
/// All queries are pure arithmetic: no allocation, no communication,
/// safe to call from any thread.
///
/// # Examples
///
/// ```
/// use dynamo_core::{RadialGrid, Rank};
/// use dynamo_radial::RadialOwnership;
///
/// let grid = RadialGrid::new(10, 6).unwrap();
/// let own = RadialOwnership::new(grid, 3, Rank(1)).unwrap();
/// assert_eq!(own.range_of(Rank(0)), 0..4);
/// assert_eq!(own.range_of(Rank(1)), 4..7);
/// assert_eq!(own.range_of(Rank(2)), 7..10);
/// assert!(own.owns(5));
/// assert!(!own.owns(7));
/// assert_eq!(own.owner_of(9), Some(Rank(2)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadialOwnership {
    grid: RadialGrid,
    size: usize,
    rank: Rank,
    local: Range<usize>,
}

impl RadialOwnership {
    /// Build the partition of `grid` over a group of `size` ranks, as
    /// seen from `rank`.
    pub fn new(grid: RadialGrid, size: usize, rank: Rank) -> Result<Self, OwnershipError> {
        if size == 0 {
            return Err(OwnershipError::EmptyGroup);
        }
        if rank.index() >= size {
            return Err(OwnershipError::RankOutOfRange { rank: rank.0, size });
        }
        let local = block_range(grid.shell_count(), size, rank.index());
        Ok(Self {
            grid,
            size,
            rank,
            local,
        })
    }

    /// Whether the calling rank owns `shell`.
    ///
    /// Out-of-range shells are owned by nobody.
    pub fn owns(&self, shell: usize) -> bool {
        self.local.contains(&shell)
    }

    /// The rank that owns `shell`, or `None` if `shell >= NR`.
    pub fn owner_of(&self, shell: usize) -> Option<Rank> {
        let nr = self.grid.shell_count();
        if shell >= nr {
            return None;
        }
        let base = nr / self.size;
        let extra = nr % self.size;
        let wide = extra * (base + 1);
        let index = if shell < wide {
            shell / (base + 1)
        } else {
            // base > 0 here: shell >= wide implies NR > extra.
            extra + (shell - wide) / base
        };
        Some(Rank(index as u32))
    }

    /// The shells owned by `rank`. Empty if `rank` is outside the group.
    pub fn range_of(&self, rank: Rank) -> Range<usize> {
        if rank.index() >= self.size {
            return 0..0;
        }
        block_range(self.grid.shell_count(), self.size, rank.index())
    }

    /// The shells owned by the calling rank.
    pub fn local_range(&self) -> Range<usize> {
        self.local.clone()
    }

    /// Number of shells owned by the calling rank.
    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    /// Iterate the shells owned by the calling rank, in ascending order.
    pub fn owned_shells(&self) -> Range<usize> {
        self.local.clone()
    }

    /// The grid being partitioned.
    pub fn grid(&self) -> RadialGrid {
        self.grid
    }

    /// The calling rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Number of ranks in the group.
    pub fn group_size(&self) -> usize {
        self.size
    }
}

/// Contiguous block of `n` items assigned to `index` out of `parts`.
fn block_range(n: usize, parts: usize, index: usize) -> Range<usize> {
    let base = n / parts;
    let extra = n % parts;
    let start = index * base + index.min(extra);
    let len = base + usize::from(index < extra);
    start..start + len
}
