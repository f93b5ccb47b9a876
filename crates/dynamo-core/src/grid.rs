//! The radial grid: shell count and boundary shell index.

use crate::error::GridError;

/// Radial discretization shared identically by every process.
///
/// `shell_count` is NR, the number of radial shells. `boundary` is NM,
/// the index of the first shell of the outer (mantle) region. Both are
/// static for the life of the run; every derived structure (ownership,
/// profiles) is a pure function of them.
///
/// # Examples
///
/// ```
/// use dynamo_core::RadialGrid;
///
/// let grid = RadialGrid::new(10, 6).unwrap();
/// assert_eq!(grid.shell_count(), 10);
/// assert!(grid.is_inner(5));
/// assert!(!grid.is_inner(6));
/// assert_eq!(grid.outer_len(), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RadialGrid {
    shell_count: usize,
    boundary: usize,
}

impl RadialGrid {
    /// Create a grid with `shell_count` shells and boundary index `boundary`.
    ///
    /// `boundary == shell_count` is allowed and means the outer region is empty.
    pub fn new(shell_count: usize, boundary: usize) -> Result<Self, GridError> {
        if shell_count == 0 {
            return Err(GridError::EmptyGrid);
        }
        if boundary > shell_count {
            return Err(GridError::BoundaryOutOfRange {
                boundary,
                shell_count,
            });
        }
        Ok(Self {
            shell_count,
            boundary,
        })
    }

    /// Number of shells (NR).
    pub fn shell_count(&self) -> usize {
        self.shell_count
    }

    /// Boundary shell index (NM).
    pub fn boundary(&self) -> usize {
        self.boundary
    }

    /// Whether `shell` lies strictly below the boundary.
    pub fn is_inner(&self, shell: usize) -> bool {
        shell < self.boundary
    }

    /// Whether `shell` is a valid index into this grid.
    pub fn contains(&self, shell: usize) -> bool {
        shell < self.shell_count
    }

    /// Number of shells at or above the boundary.
    pub fn outer_len(&self) -> usize {
        self.shell_count - self.boundary
    }

    /// All shell indices, `0..NR`.
    pub fn shells(&self) -> std::ops::Range<usize> {
        0..self.shell_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_grid_rejected() {
        assert_eq!(RadialGrid::new(0, 0), Err(GridError::EmptyGrid));
    }

    #[test]
    fn boundary_past_end_rejected() {
        match RadialGrid::new(4, 5) {
            Err(GridError::BoundaryOutOfRange {
                boundary: 5,
                shell_count: 4,
            }) => {}
            other => panic!("expected BoundaryOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn boundary_at_end_means_no_outer_region() {
        let g = RadialGrid::new(4, 4).unwrap();
        assert_eq!(g.outer_len(), 0);
        assert!(g.shells().all(|s| g.is_inner(s)));
    }

    #[test]
    fn boundary_zero_means_all_outer() {
        let g = RadialGrid::new(3, 0).unwrap();
        assert_eq!(g.outer_len(), 3);
        assert!(!g.is_inner(0));
    }

    proptest! {
        #[test]
        fn inner_and_outer_cover_the_grid(nr in 1usize..500, nm in 0usize..500) {
            let g = RadialGrid::new(nr, nm.min(nr)).unwrap();
            let inner = g.shells().filter(|&s| g.is_inner(s)).count();
            prop_assert_eq!(inner, g.boundary());
            prop_assert_eq!(inner + g.outer_len(), g.shell_count());
            prop_assert!(!g.contains(nr));
        }
    }
}
