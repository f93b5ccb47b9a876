//! Per-cycle timing metrics for the diagnostic pipeline.

/// Timing collected during a single diagnostic cycle.
///
/// All durations are in microseconds. Reduction time includes waiting
/// for the slowest rank, so on a balanced run it is dominated by load
/// imbalance rather than by communication.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleMetrics {
    /// Wall-clock time for the whole cycle.
    pub total_us: u64,
    /// Time spent in the Local Fill, all producers together.
    pub fill_us: u64,
    /// Per-producer fill times: `(name, microseconds)`.
    pub producer_us: Vec<(String, u64)>,
    /// Time spent in the collective reduction.
    pub reduce_us: u64,
    /// Time spent appending to the log (zero off the root).
    pub append_us: u64,
    /// Producer failures on this rank in this cycle.
    pub local_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = CycleMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.fill_us, 0);
        assert!(m.producer_us.is_empty());
        assert_eq!(m.reduce_us, 0);
        assert_eq!(m.append_us, 0);
        assert_eq!(m.local_failures, 0);
    }
}
