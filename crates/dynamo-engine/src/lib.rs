//! Run configuration and the diagnostic aggregation pipeline.
//!
//! A run builds a [`RunConfig`], validates it, computes the solver's
//! [`SolverCoefficients`] once, and then creates one
//! [`DiagnosticPipeline`] per rank. Each diagnostic interval the solver
//! calls [`DiagnosticPipeline::run_cycle`] on every rank; the root
//! appends the reduced record to its [`DiagnosticLog`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod setup;
pub mod writer;

pub use config::{ConfigError, RunConfig, TruncationConfig};
pub use metrics::CycleMetrics;
pub use pipeline::{CycleError, CyclePhase, CycleReport, DiagnosticPipeline, LogSink};
pub use setup::SolverCoefficients;
pub use writer::DiagnosticLog;
