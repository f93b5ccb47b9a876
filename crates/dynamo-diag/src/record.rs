//! Flat per-cycle accumulator laid out by a [`DiagnosticSchema`].

use std::sync::Arc;

use crate::error::DiagnosticError;
use crate::schema::DiagnosticSchema;

/// One rank's diagnostic values for one cycle.
///
/// Before the reduction the record holds this rank's partial sums over
/// the shells it owns; after it, every rank holds the same totals.
/// Values are stored contiguously in schema order, so the whole record
/// can be handed to a collective as a single `&mut [f64]`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dynamo_diag::{DiagnosticRecord, DiagnosticSchema};
///
/// let schema = Arc::new(DiagnosticSchema::builder().scalar("count").slot("split", 2).build().unwrap());
/// let mut rec = DiagnosticRecord::new(schema);
/// rec.add("count", 5.0).unwrap();
/// rec.add_at("split", 1, 2.5).unwrap();
/// assert_eq!(rec.as_slice(), &[5.0, 0.0, 2.5]);
/// rec.reset();
/// assert_eq!(rec.value("count"), Some(0.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosticRecord {
    schema: Arc<DiagnosticSchema>,
    values: Vec<f64>,
}

impl DiagnosticRecord {
    /// A zeroed record for `schema`.
    pub fn new(schema: Arc<DiagnosticSchema>) -> Self {
        let values = vec![0.0; schema.len()];
        Self { schema, values }
    }

    /// The layout this record follows.
    pub fn schema(&self) -> &Arc<DiagnosticSchema> {
        &self.schema
    }

    /// Zero every component.
    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }

    /// All components of a slot.
    pub fn slot(&self, name: &str) -> Option<&[f64]> {
        let range = self.schema.range_of(name)?;
        Some(&self.values[range])
    }

    /// Mutable access to all components of a slot.
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        let range = self.schema.range_of(name)?;
        Some(&mut self.values[range])
    }

    /// First component of a slot; the natural accessor for scalars.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.slot(name).and_then(|s| s.first().copied())
    }

    /// Add `v` to component 0 of `name`.
    pub fn add(&mut self, name: &str, v: f64) -> Result<(), DiagnosticError> {
        self.add_at(name, 0, v)
    }

    /// Add `v` to component `index` of `name`.
    pub fn add_at(&mut self, name: &str, index: usize, v: f64) -> Result<(), DiagnosticError> {
        *self.component_mut(name, index)? += v;
        Ok(())
    }

    /// Overwrite component 0 of `name`.
    pub fn set(&mut self, name: &str, v: f64) -> Result<(), DiagnosticError> {
        *self.component_mut(name, 0)? = v;
        Ok(())
    }

    /// The flat component buffer, in schema order.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// The flat component buffer, for handing to a collective.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    fn component_mut(&mut self, name: &str, index: usize) -> Result<&mut f64, DiagnosticError> {
        let range = self
            .schema
            .range_of(name)
            .ok_or_else(|| DiagnosticError::UnknownSlot {
                name: name.to_string(),
            })?;
        let arity = range.len();
        if index >= arity {
            return Err(DiagnosticError::ComponentOutOfRange {
                name: name.to_string(),
                index,
                arity,
            });
        }
        Ok(&mut self.values[range.start + index])
    }
}
