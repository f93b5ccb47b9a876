//! Test utilities and mock types for dynamo development.
//!
//! Provides a mock [`ShellData`](dynamo_core::ShellData), standard test
//! producers, a cloneable in-memory log sink, and [`run_on_ranks`] for
//! driving an in-process group with one thread per rank.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod group;
pub mod shells;

pub use fixtures::{FailingProducer, RankValueProducer, SharedBuffer};
pub use group::run_on_ranks;
pub use shells::MockShellData;
