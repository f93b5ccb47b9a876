//! Error types for grid construction and parameter parsing.

use std::error::Error;
use std::fmt;

/// Errors from [`RadialGrid::new`](crate::RadialGrid::new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// The grid has zero shells.
    EmptyGrid,
    /// The boundary shell index lies beyond the last shell.
    BoundaryOutOfRange {
        /// The requested boundary index.
        boundary: usize,
        /// Number of shells in the grid.
        shell_count: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "radial grid must have at least one shell"),
            Self::BoundaryOutOfRange {
                boundary,
                shell_count,
            } => write!(
                f,
                "boundary index {boundary} exceeds shell count {shell_count}"
            ),
        }
    }
}

impl Error for GridError {}

/// Errors from [`ParameterSet::parse_str`](crate::ParameterSet::parse_str).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterError {
    /// A non-comment line is not of the form `name = value`.
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },
    /// The value could not be parsed as a number.
    InvalidValue {
        /// 1-based line number.
        line: usize,
        /// Parameter name.
        key: String,
        /// The unparsable value text.
        value: String,
    },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { line, content } => {
                write!(f, "line {line}: expected `name = value`, got '{content}'")
            }
            Self::InvalidValue { line, key, value } => {
                write!(f, "line {line}: parameter '{key}' has non-numeric value '{value}'")
            }
        }
    }
}

impl Error for ParameterError {}
