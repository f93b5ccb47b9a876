//! Process-group collectives for radially decomposed dynamo runs.
//!
//! The [`Communicator`] trait is the only way the rest of the workspace
//! talks across processes. Two backends ship here:
//!
//! - [`SingleProcess`]: a group of one; every collective is the identity.
//! - [`LocalComm`]: an in-process group with one endpoint per rank,
//!   meant to be moved onto one thread each. The root gathers over
//!   crossbeam channels, sums in rank order and broadcasts the result,
//!   so every rank receives bit-identical values.
//!
//! A binding to a real message-passing library is another implementor
//! of [`Communicator`]; nothing above this crate depends on the backend.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod communicator;
pub mod error;
pub mod local;
pub mod single;

pub use communicator::Communicator;
pub use error::CommError;
pub use local::LocalComm;
pub use single::SingleProcess;
