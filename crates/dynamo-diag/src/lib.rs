//! Diagnostic records and the producers that fill them.
//!
//! A run declares a fixed [`DiagnosticSchema`] of named slots before its
//! first cycle. Each cycle, every rank zeroes a [`DiagnosticRecord`] and
//! runs its [`DiagnosticProducer`]s over the shells it owns; the engine
//! then sums the records across the process group.
//!
//! Producers get a read-only [`FillContext`] and a [`SlotWriter`] limited
//! to the slots they declared. The helpers in [`parallel`] let them use
//! the rank's rayon pool without making results depend on how work was
//! split across threads.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builtin;
pub mod error;
pub mod parallel;
pub mod producer;
pub mod record;
pub mod registry;
pub mod schema;

pub use builtin::{BoundarySplit, DiffusivitySum, QuantitySum, ShellCount};
pub use error::{DiagnosticError, RegistryError, SchemaError};
pub use producer::{DiagnosticProducer, FillContext, SlotWriter};
pub use record::DiagnosticRecord;
pub use registry::{DiagnosticRegistry, ProducerFactory, ProducerSpec};
pub use schema::{DiagnosticSchema, DiagnosticSchemaBuilder, SlotDef};
