//! Error types for schemas, records, producers and the registry.

use std::error::Error;
use std::fmt;

/// Errors from [`DiagnosticSchemaBuilder::build`](crate::DiagnosticSchemaBuilder::build).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// A slot was declared with an empty name.
    EmptyName,
    /// A slot was declared with zero components.
    ZeroArity {
        /// The slot name.
        name: String,
    },
    /// Two slots share a name.
    DuplicateSlot {
        /// The repeated name.
        name: String,
    },
    /// A slot name contains whitespace, which would break log columns.
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "diagnostic slot name is empty"),
            Self::ZeroArity { name } => write!(f, "diagnostic slot '{name}' has zero arity"),
            Self::DuplicateSlot { name } => {
                write!(f, "diagnostic slot '{name}' declared more than once")
            }
            Self::InvalidName { name } => {
                write!(f, "diagnostic slot name '{name}' contains whitespace")
            }
        }
    }
}

impl Error for SchemaError {}

/// Errors from filling a [`DiagnosticRecord`](crate::DiagnosticRecord).
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticError {
    /// The named slot is not in the schema.
    UnknownSlot {
        /// The requested name.
        name: String,
    },
    /// A component index is past the slot's arity.
    ComponentOutOfRange {
        /// The slot name.
        name: String,
        /// The requested component.
        index: usize,
        /// The slot's arity.
        arity: usize,
    },
    /// A producer wrote to a slot it did not declare.
    UndeclaredSlot {
        /// The writing producer.
        producer: String,
        /// The slot it tried to write.
        slot: String,
    },
    /// The shell data does not provide a quantity the producer needs.
    MissingQuantity {
        /// The quantity name.
        name: String,
    },
    /// A quantity does not cover every shell.
    QuantityLength {
        /// The quantity name.
        name: String,
        /// Shell count of the grid.
        expected: usize,
        /// Length of the provided array.
        found: usize,
    },
    /// A producer failed for a reason of its own.
    ProducerFailed {
        /// The failing producer.
        producer: String,
        /// Human-readable cause.
        reason: String,
    },
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSlot { name } => write!(f, "unknown diagnostic slot '{name}'"),
            Self::ComponentOutOfRange { name, index, arity } => write!(
                f,
                "component {index} out of range for slot '{name}' of arity {arity}"
            ),
            Self::UndeclaredSlot { producer, slot } => write!(
                f,
                "producer '{producer}' wrote to slot '{slot}' which it did not declare"
            ),
            Self::MissingQuantity { name } => {
                write!(f, "shell data does not provide quantity '{name}'")
            }
            Self::QuantityLength {
                name,
                expected,
                found,
            } => write!(
                f,
                "quantity '{name}' has {found} entries, expected {expected}"
            ),
            Self::ProducerFailed { producer, reason } => {
                write!(f, "producer '{producer}' failed: {reason}")
            }
        }
    }
}

impl Error for DiagnosticError {}

/// Errors from [`DiagnosticRegistry`](crate::DiagnosticRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// No producer is registered under this name.
    UnknownProducer {
        /// The requested name.
        name: String,
    },
    /// The producer needs a quantity name and none was given.
    MissingQuantity {
        /// The producer name.
        producer: String,
    },
    /// A producer name was registered twice.
    DuplicateProducer {
        /// The repeated name.
        name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProducer { name } => write!(f, "no diagnostic producer named '{name}'"),
            Self::MissingQuantity { producer } => {
                write!(f, "producer '{producer}' requires a quantity name")
            }
            Self::DuplicateProducer { name } => {
                write!(f, "diagnostic producer '{name}' registered twice")
            }
        }
    }
}

impl Error for RegistryError {}
