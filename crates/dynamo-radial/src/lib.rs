//! Radial shell ownership and per-shell material profiles.
//!
//! # Ownership
//!
//! [`RadialOwnership`] partitions the NR shells of a [`RadialGrid`] into
//! contiguous, balanced ranges, one per rank. It is a pure function of
//! the grid, the group size and the rank, so every process computes the
//! same partition without communicating.
//!
//! # Profiles
//!
//! A [`DiffusivityProfile`] maps a shell index to a diffusivity value.
//! Profiles always produce the full NR-length array, regardless of
//! ownership, because the solver's radial stencils read across partition
//! boundaries. [`ProfileKind`] selects a strategy at startup.
//!
//! [`VariableTruncation`] is the per-shell spherical-harmonic truncation
//! profile.
//!
//! [`RadialGrid`]: dynamo_core::RadialGrid

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod ownership;
pub mod profile;
pub mod truncation;

pub use error::{OwnershipError, ProfileError};
pub use ownership::RadialOwnership;
pub use profile::{
    DiffusivityProfile, MantleStep, ProfileKind, SmoothStep, Tabulated, Uniform,
    DEFAULT_MANTLE_KEY,
};
pub use truncation::VariableTruncation;
