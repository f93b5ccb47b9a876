//! The [`DiagnosticProducer`] trait and the context it fills from.
//!
//! Producers are stateless plug-ins run once per rank per cycle. They
//! declare their slots at registration and, during the fill, see only
//! the read-only [`FillContext`] and a [`SlotWriter`] restricted to
//! those slots. Neither gives access to the process group, so a
//! producer cannot start a collective while its peers are elsewhere.

use std::ops::Range;

use dynamo_core::{CycleId, RadialGrid, ShellData};
use dynamo_radial::RadialOwnership;
use rayon::ThreadPool;

use crate::error::DiagnosticError;
use crate::parallel;
use crate::record::DiagnosticRecord;
use crate::schema::SlotDef;

/// A named diagnostic plug-in.
///
/// # Contract
///
/// - `slots()` is called once, when the schema is built; it must return
///   the same list on every rank.
/// - `fill()` reads only entries of owned shells
///   ([`FillContext::owned_shells`]). Reading unowned shells is not
///   detected and double-counts after the reduction.
/// - `fill()` combines values with sums only, and must produce the same
///   result for any thread count (the helpers on [`FillContext`] do).
///
/// # Examples
///
/// ```
/// use dynamo_diag::{DiagnosticError, DiagnosticProducer, FillContext, SlotDef, SlotWriter};
///
/// struct OuterShells;
///
/// impl DiagnosticProducer for OuterShells {
///     fn name(&self) -> &str { "outer_shells" }
///
///     fn slots(&self) -> Vec<SlotDef> { vec![SlotDef::scalar("outer")] }
///
///     fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
///         let grid = ctx.grid();
///         let n = ctx.owned_shells().filter(|&s| !grid.is_inner(s)).count();
///         out.add("outer", n as f64)
///     }
/// }
/// ```
pub trait DiagnosticProducer: Send + Sync {
    /// Registry name, used in error messages and logs.
    fn name(&self) -> &str;

    /// Slots this producer writes, in column order.
    fn slots(&self) -> Vec<SlotDef>;

    /// Accumulate this rank's partial values.
    fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError>;
}

// ── FillContext ─────────────────────────────────────────────────

/// Read-only inputs to one rank's Local Fill.
pub struct FillContext<'a> {
    ownership: &'a RadialOwnership,
    diffusivity: &'a [f64],
    shells: &'a dyn ShellData,
    pool: &'a ThreadPool,
    cycle: CycleId,
    time: f64,
}

impl<'a> FillContext<'a> {
    /// Assemble a context. Called by the pipeline, or directly in tests.
    pub fn new(
        ownership: &'a RadialOwnership,
        diffusivity: &'a [f64],
        shells: &'a dyn ShellData,
        pool: &'a ThreadPool,
        cycle: CycleId,
        time: f64,
    ) -> Self {
        Self {
            ownership,
            diffusivity,
            shells,
            pool,
            cycle,
            time,
        }
    }

    /// This rank's ownership map.
    pub fn ownership(&self) -> &RadialOwnership {
        self.ownership
    }

    /// The radial grid.
    pub fn grid(&self) -> RadialGrid {
        self.ownership.grid()
    }

    /// Shells owned by this rank.
    pub fn owned_shells(&self) -> Range<usize> {
        self.ownership.owned_shells()
    }

    /// The full diffusivity array (NR entries, identical on every rank).
    pub fn diffusivity(&self) -> &[f64] {
        self.diffusivity
    }

    /// The solver's per-shell state.
    pub fn shells(&self) -> &dyn ShellData {
        self.shells
    }

    /// A named quantity, checked to cover every shell of the grid.
    pub fn quantity(&self, name: &str) -> Result<&'a [f64], DiagnosticError> {
        let data = self
            .shells
            .quantity(name)
            .ok_or_else(|| DiagnosticError::MissingQuantity {
                name: name.to_string(),
            })?;
        let expected = self.grid().shell_count();
        if data.len() != expected {
            return Err(DiagnosticError::QuantityLength {
                name: name.to_string(),
                expected,
                found: data.len(),
            });
        }
        Ok(data)
    }

    /// Pool for intra-rank parallel work.
    pub fn pool(&self) -> &ThreadPool {
        self.pool
    }

    /// The cycle being filled.
    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    /// Simulation time of the cycle.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sum `f` over owned shells, in parallel, combined in shell order.
    pub fn owned_sum<F>(&self, f: F) -> f64
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        parallel::ordered_sum(self.pool, self.owned_shells(), f)
    }

    /// Sum `f` over owned shells, split into `[below NM, at or above NM]`.
    pub fn owned_boundary_sum<F>(&self, f: F) -> [f64; 2]
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        let grid = self.grid();
        parallel::ordered_binned_sum::<2, _, _>(self.pool, self.owned_shells(), f, |s| {
            usize::from(!grid.is_inner(s))
        })
    }
}

// ── SlotWriter ──────────────────────────────────────────────────

/// Write access to the slots one producer declared.
pub struct SlotWriter<'a> {
    record: &'a mut DiagnosticRecord,
    producer: &'a str,
    declared: &'a [SlotDef],
}

impl<'a> SlotWriter<'a> {
    /// Restrict `record` to `declared` on behalf of `producer`.
    pub fn new(record: &'a mut DiagnosticRecord, producer: &'a str, declared: &'a [SlotDef]) -> Self {
        Self {
            record,
            producer,
            declared,
        }
    }

    fn check(&self, slot: &str) -> Result<(), DiagnosticError> {
        if self.declared.iter().any(|d| d.name == slot) {
            Ok(())
        } else {
            Err(DiagnosticError::UndeclaredSlot {
                producer: self.producer.to_string(),
                slot: slot.to_string(),
            })
        }
    }

    /// Add `v` to component 0 of `slot`.
    pub fn add(&mut self, slot: &str, v: f64) -> Result<(), DiagnosticError> {
        self.check(slot)?;
        self.record.add(slot, v)
    }

    /// Add `v` to component `index` of `slot`.
    pub fn add_at(&mut self, slot: &str, index: usize, v: f64) -> Result<(), DiagnosticError> {
        self.check(slot)?;
        self.record.add_at(slot, index, v)
    }

    /// Add `values` componentwise to `slot`.
    pub fn add_all(&mut self, slot: &str, values: &[f64]) -> Result<(), DiagnosticError> {
        for (i, &v) in values.iter().enumerate() {
            self.add_at(slot, i, v)?;
        }
        Ok(())
    }

    /// Current components of `slot`.
    pub fn get(&self, slot: &str) -> Result<&[f64], DiagnosticError> {
        self.check(slot)?;
        self.record
            .slot(slot)
            .ok_or_else(|| DiagnosticError::UnknownSlot {
                name: slot.to_string(),
            })
    }
}
