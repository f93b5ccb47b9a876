//! Dynamo: radial diffusivity setup and deterministic diagnostic
//! aggregation for parallel geodynamo solvers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all dynamo sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use dynamo::prelude::*;
//! use dynamo::comm::SingleProcess;
//!
//! struct Ramp(Vec<f64>);
//! impl ShellData for Ramp {
//!     fn shell_count(&self) -> usize { self.0.len() }
//!     fn quantity(&self, name: &str) -> Option<&[f64]> {
//!         (name == "ke").then_some(self.0.as_slice())
//!     }
//! }
//!
//! // 10 shells, the outer 4 of them (index >= 6) in the mantle.
//! let mut config = RunConfig::new(RadialGrid::new(10, 6).unwrap());
//! config.profile = ProfileKind::mantle_step();
//! config.diagnostics = vec![
//!     ProducerSpec::new("shell_count"),
//!     ProducerSpec::new("quantity_sum").with_quantity("ke"),
//! ];
//! let params = ParameterSet::parse_str("etam = 0.01").unwrap();
//! let coeffs = Arc::new(SolverCoefficients::build(&config, &params, None).unwrap());
//! assert_eq!(coeffs.diffusivity()[9], 0.01);
//!
//! let registry = DiagnosticRegistry::with_builtins();
//! let mut pipeline = DiagnosticPipeline::new(SingleProcess, &config, coeffs, &registry).unwrap();
//! let state = Ramp((0..10).map(f64::from).collect());
//! let report = pipeline.run_cycle(0.0, &state).unwrap();
//! assert_eq!(report.record.value("ke_sum"), Some(45.0));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `dynamo-core` | Grid, ranks, cycle ids, parameters, `ShellData` |
//! | [`radial`] | `dynamo-radial` | Shell ownership, diffusivity profiles, truncation |
//! | [`comm`] | `dynamo-comm` | Process-group communicators |
//! | [`diag`] | `dynamo-diag` | Schemas, records, producers, registry |
//! | [`engine`] | `dynamo-engine` | Run configuration and the cycle pipeline |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`dynamo-core`).
pub use dynamo_core as types;

/// Radial decomposition and coefficient profiles (`dynamo-radial`).
///
/// [`radial::RadialOwnership`] answers which rank owns which shell;
/// [`radial::DiffusivityProfile`] implementations fill per-shell arrays.
pub use dynamo_radial as radial;

/// Process-group communication (`dynamo-comm`).
///
/// [`comm::SingleProcess`] for serial runs, [`comm::LocalComm`] for an
/// in-process group of ranks on threads.
pub use dynamo_comm as comm;

/// Diagnostic schemas, records and producers (`dynamo-diag`).
pub use dynamo_diag as diag;

/// Run configuration and the diagnostic pipeline (`dynamo-engine`).
pub use dynamo_engine as engine;

/// Common imports for typical dynamo usage.
///
/// ```rust
/// use dynamo::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use dynamo_core::{CycleId, ParameterSet, RadialGrid, Rank, ShellData};

    // Radial
    pub use dynamo_radial::{DiffusivityProfile, ProfileKind, RadialOwnership};

    // Communication
    pub use dynamo_comm::{CommError, Communicator};

    // Diagnostics
    pub use dynamo_diag::{
        DiagnosticError, DiagnosticProducer, DiagnosticRecord, DiagnosticRegistry, FillContext,
        ProducerSpec, SlotDef, SlotWriter,
    };

    // Engine
    pub use dynamo_engine::{
        ConfigError, CycleError, CycleReport, DiagnosticPipeline, RunConfig, SolverCoefficients,
    };
}
