//! Built-in producers.
//!
//! These cover bookkeeping that needs no physics: shell counts, plain
//! sums of a named quantity, the same sum split at the boundary shell,
//! and a diffusivity checksum. Physical diagnostics (energies, Nusselt
//! number, dipole moment) are registered by the solver.

use crate::error::DiagnosticError;
use crate::producer::{DiagnosticProducer, FillContext, SlotWriter};
use crate::schema::SlotDef;

/// Number of shells this rank owns. Reduces to NR.
#[derive(Clone, Debug, Default)]
pub struct ShellCount;

impl ShellCount {
    /// Slot name.
    pub const SLOT: &'static str = "count";
}

impl DiagnosticProducer for ShellCount {
    fn name(&self) -> &str {
        "shell_count"
    }

    fn slots(&self) -> Vec<SlotDef> {
        vec![SlotDef::scalar(Self::SLOT)]
    }

    fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
        out.add(Self::SLOT, ctx.ownership().local_len() as f64)
    }
}

/// Sum of a named quantity over owned shells, into `<quantity>_sum`.
#[derive(Clone, Debug)]
pub struct QuantitySum {
    quantity: String,
    slot: String,
}

impl QuantitySum {
    /// Sum `quantity`.
    pub fn new(quantity: impl Into<String>) -> Self {
        let quantity = quantity.into();
        let slot = format!("{quantity}_sum");
        Self { quantity, slot }
    }

    /// The slot this producer writes.
    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl DiagnosticProducer for QuantitySum {
    fn name(&self) -> &str {
        "quantity_sum"
    }

    fn slots(&self) -> Vec<SlotDef> {
        vec![SlotDef::scalar(self.slot.clone())]
    }

    fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
        let data = ctx.quantity(&self.quantity)?;
        out.add(&self.slot, ctx.owned_sum(|s| data[s]))
    }
}

/// A quantity summed separately below NM and at or above NM, into the
/// arity-2 slot `<quantity>_split`.
#[derive(Clone, Debug)]
pub struct BoundarySplit {
    quantity: String,
    slot: String,
}

impl BoundarySplit {
    /// Split `quantity` at the grid boundary.
    pub fn new(quantity: impl Into<String>) -> Self {
        let quantity = quantity.into();
        let slot = format!("{quantity}_split");
        Self { quantity, slot }
    }

    /// The slot this producer writes.
    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl DiagnosticProducer for BoundarySplit {
    fn name(&self) -> &str {
        "boundary_split"
    }

    fn slots(&self) -> Vec<SlotDef> {
        vec![SlotDef::new(self.slot.clone(), 2)]
    }

    fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
        let data = ctx.quantity(&self.quantity)?;
        out.add_all(&self.slot, &ctx.owned_boundary_sum(|s| data[s]))
    }
}

/// Sum of the diffusivity array over owned shells, into `eta_sum`.
///
/// The reduced value equals the sum of the full array only if every
/// rank built the same profile, which makes it a cheap consistency
/// check across ranks.
#[derive(Clone, Debug, Default)]
pub struct DiffusivitySum;

impl DiffusivitySum {
    /// Slot name.
    pub const SLOT: &'static str = "eta_sum";
}

impl DiagnosticProducer for DiffusivitySum {
    fn name(&self) -> &str {
        "diffusivity_sum"
    }

    fn slots(&self) -> Vec<SlotDef> {
        vec![SlotDef::scalar(Self::SLOT)]
    }

    fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
        let eta = ctx.diffusivity();
        let expected = ctx.grid().shell_count();
        if eta.len() != expected {
            return Err(DiagnosticError::QuantityLength {
                name: "diffusivity".to_string(),
                expected,
                found: eta.len(),
            });
        }
        out.add(Self::SLOT, ctx.owned_sum(|s| eta[s]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DiagnosticRecord;
    use crate::schema::DiagnosticSchema;
    use dynamo_core::{CycleId, RadialGrid, Rank, ShellData};
    use dynamo_radial::RadialOwnership;
    use rayon::{ThreadPool, ThreadPoolBuilder};
    use std::sync::Arc;

    struct Energy(Vec<f64>);

    impl ShellData for Energy {
        fn shell_count(&self) -> usize {
            self.0.len()
        }
        fn quantity(&self, name: &str) -> Option<&[f64]> {
            (name == "ke").then_some(self.0.as_slice())
        }
    }

    fn pool() -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    /// Fill `producer` on every rank of a `size`-rank split of NR=10,
    /// NM=6 and sum the records, standing in for the reduction.
    fn fill_all(producer: &dyn DiagnosticProducer, size: usize) -> DiagnosticRecord {
        let grid = RadialGrid::new(10, 6).unwrap();
        let slots = producer.slots();
        let schema = Arc::new(DiagnosticSchema::builder().extend(slots.clone()).build().unwrap());
        let data = Energy((1..=10).map(|s| s as f64).collect());
        let eta: Vec<f64> = (0..10).map(|s| if s < 6 { 1.0 } else { 0.01 }).collect();
        let pool = pool();
        let mut total = DiagnosticRecord::new(schema.clone());
        for r in 0..size {
            let own = RadialOwnership::new(grid, size, Rank(r as u32)).unwrap();
            let ctx = FillContext::new(&own, &eta, &data, &pool, CycleId(1), 0.5);
            let mut rec = DiagnosticRecord::new(schema.clone());
            producer
                .fill(&ctx, &mut SlotWriter::new(&mut rec, producer.name(), &slots))
                .unwrap();
            for (t, v) in total.as_mut_slice().iter_mut().zip(rec.as_slice()) {
                *t += v;
            }
        }
        total
    }

    #[test]
    fn shell_count_reduces_to_shell_total() {
        for size in 1..=12 {
            assert_eq!(fill_all(&ShellCount, size).value("count"), Some(10.0));
        }
    }

    #[test]
    fn quantity_sum_has_no_double_counting() {
        let p = QuantitySum::new("ke");
        assert_eq!(p.slot(), "ke_sum");
        for size in 1..=5 {
            assert_eq!(fill_all(&p, size).value("ke_sum"), Some(55.0));
        }
    }

    #[test]
    fn boundary_split_separates_inner_and_outer() {
        let p = BoundarySplit::new("ke");
        for size in [1, 2, 3, 7] {
            let rec = fill_all(&p, size);
            // 1+..+6 below NM, 7+..+10 above.
            assert_eq!(rec.slot("ke_split"), Some(&[21.0, 34.0][..]));
        }
    }

    #[test]
    fn diffusivity_sum_matches_full_array() {
        let rec = fill_all(&DiffusivitySum, 3);
        let v = rec.value("eta_sum").unwrap();
        assert!((v - 6.04).abs() < 1e-12);
    }

    #[test]
    fn missing_quantity_fails_fill() {
        let grid = RadialGrid::new(4, 2).unwrap();
        let own = RadialOwnership::new(grid, 1, Rank(0)).unwrap();
        let data = Energy(vec![0.0; 4]);
        let eta = vec![1.0; 4];
        let pool = pool();
        let ctx = FillContext::new(&own, &eta, &data, &pool, CycleId(0), 0.0);
        let p = QuantitySum::new("me");
        let slots = p.slots();
        let schema = Arc::new(DiagnosticSchema::builder().extend(slots.clone()).build().unwrap());
        let mut rec = DiagnosticRecord::new(schema);
        let err = p
            .fill(&ctx, &mut SlotWriter::new(&mut rec, p.name(), &slots))
            .unwrap_err();
        assert_eq!(err, DiagnosticError::MissingQuantity { name: "me".into() });
    }
}
