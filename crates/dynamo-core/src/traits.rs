//! Read-only access to the solver's per-shell state.

/// Read-only view of per-shell solver state consumed by diagnostics.
///
/// Implemented by the solver (or by test mocks). Every quantity is a
/// full-length array indexed by global shell index, but a diagnostic
/// producer may only use entries for shells its process owns. Reading
/// an unowned entry is not detected here; it silently double-counts
/// after the reduction.
///
/// `Sync` because the diagnostic fill may read it from several threads.
pub trait ShellData: Sync {
    /// Number of shells covered by every quantity.
    fn shell_count(&self) -> usize;

    /// A named per-shell quantity (e.g. kinetic energy per shell).
    ///
    /// Returns `None` if the quantity is not provided.
    fn quantity(&self, name: &str) -> Option<&[f64]>;

    /// Radius of a shell, if the solver exposes the radial grid.
    ///
    /// Default: `None`.
    fn radius(&self, _shell: usize) -> Option<f64> {
        None
    }
}
