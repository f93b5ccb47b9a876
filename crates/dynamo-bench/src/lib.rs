//! Benchmark profiles for the dynamo diagnostic pipeline.
//!
//! - [`reference_config`]: 129 shells, boundary at 96, the four built-in
//!   producers over quantity `ke`
//! - [`stress_config`]: the same diagnostics over 4097 shells

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use dynamo_core::{ParameterSet, RadialGrid};
use dynamo_diag::ProducerSpec;
use dynamo_engine::{RunConfig, SolverCoefficients};
use dynamo_radial::ProfileKind;

/// Mantle-to-core diffusivity ratio used by every profile.
pub const MANTLE_FACTOR: f64 = 0.01;

fn profile(shell_count: usize, boundary: usize, fill_threads: usize) -> RunConfig {
    let grid = RadialGrid::new(shell_count, boundary).unwrap();
    let mut cfg = RunConfig::new(grid);
    cfg.profile = ProfileKind::mantle_step();
    cfg.diagnostics = vec![
        ProducerSpec::new("shell_count"),
        ProducerSpec::new("diffusivity_sum"),
        ProducerSpec::new("quantity_sum").with_quantity("ke"),
        ProducerSpec::new("boundary_split").with_quantity("ke"),
    ];
    cfg.fill_threads = Some(fill_threads);
    cfg
}

/// Reference profile: NR=129, NM=96.
pub fn reference_config(fill_threads: usize) -> RunConfig {
    profile(129, 96, fill_threads)
}

/// Stress profile: NR=4097, NM=3072.
pub fn stress_config(fill_threads: usize) -> RunConfig {
    profile(4097, 3072, fill_threads)
}

/// Coefficients for `config` with [`MANTLE_FACTOR`].
pub fn coefficients(config: &RunConfig) -> Arc<SolverCoefficients> {
    let params: ParameterSet = [("etam", MANTLE_FACTOR)].into_iter().collect();
    Arc::new(SolverCoefficients::build(config, &params, None).unwrap())
}
