//! Core types and traits for radially decomposed dynamo diagnostics.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by the rest of the workspace:
//! rank and cycle identifiers, the radial grid description, the
//! read-only [`ParameterSet`], the [`ShellData`] view of solver state,
//! and the associated error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;
pub mod id;
pub mod params;
pub mod traits;

pub use error::{GridError, ParameterError};
pub use grid::RadialGrid;
pub use id::{CycleId, Rank};
pub use params::ParameterSet;
pub use traits::ShellData;
