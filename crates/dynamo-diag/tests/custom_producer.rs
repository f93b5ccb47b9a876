//! Integration test: a solver-defined producer registered by name.
//!
//! Registers a producer outside this crate, builds it from a spec the way
//! run configuration would, and fills it next to a built-in over a
//! two-rank split, summing the records by hand in place of the
//! reduction.

use std::sync::Arc;

use dynamo_core::{CycleId, RadialGrid, Rank, ShellData};
use dynamo_diag::parallel::ordered_sum;
use dynamo_diag::{
    DiagnosticError, DiagnosticProducer, DiagnosticRecord, DiagnosticRegistry, DiagnosticSchema,
    FillContext, ProducerSpec, RegistryError, SlotDef, SlotWriter,
};
use dynamo_radial::RadialOwnership;
use rayon::ThreadPoolBuilder;

/// Diffusivity-weighted sum of a quantity, plus the current time.
struct WeightedSum {
    quantity: String,
}

impl DiagnosticProducer for WeightedSum {
    fn name(&self) -> &str {
        "weighted_sum"
    }

    fn slots(&self) -> Vec<SlotDef> {
        vec![SlotDef::scalar("weighted"), SlotDef::scalar("clock")]
    }

    fn fill(&self, ctx: &FillContext<'_>, out: &mut SlotWriter<'_>) -> Result<(), DiagnosticError> {
        let data = ctx.quantity(&self.quantity)?;
        let eta = ctx.diffusivity();
        let total = ordered_sum(ctx.pool(), ctx.owned_shells(), |s| eta[s] * data[s]);
        out.add("weighted", total)?;
        if ctx.ownership().rank().is_root() {
            out.add("clock", ctx.time())?;
        }
        Ok(())
    }
}

struct Temperature(Vec<f64>);

impl ShellData for Temperature {
    fn shell_count(&self) -> usize {
        self.0.len()
    }
    fn quantity(&self, name: &str) -> Option<&[f64]> {
        (name == "temp").then_some(self.0.as_slice())
    }
}

fn registry() -> DiagnosticRegistry {
    let mut reg = DiagnosticRegistry::with_builtins();
    reg.register("weighted_sum", |spec| {
        let quantity = spec
            .quantity
            .clone()
            .ok_or_else(|| RegistryError::MissingQuantity {
                producer: spec.name.clone(),
            })?;
        Ok(Box::new(WeightedSum { quantity }) as Box<dyn DiagnosticProducer>)
    })
    .unwrap();
    reg
}

#[test]
fn registered_producer_needs_its_quantity() {
    let reg = registry();
    assert!(reg.contains("weighted_sum"));
    assert!(matches!(
        reg.build(&ProducerSpec::new("weighted_sum")),
        Err(RegistryError::MissingQuantity { .. })
    ));
}

#[test]
fn registering_a_builtin_name_twice_fails() {
    let mut reg = registry();
    let err = reg
        .register("shell_count", |_| {
            Err(RegistryError::UnknownProducer {
                name: "unused".into(),
            })
        })
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateProducer {
            name: "shell_count".into()
        }
    );
}

#[test]
fn custom_and_builtin_producers_share_a_record() {
    let specs = [
        ProducerSpec::new("shell_count"),
        ProducerSpec::new("weighted_sum").with_quantity("temp"),
    ];
    let producers = registry().build_all(&specs).unwrap();
    let declared: Vec<Vec<SlotDef>> = producers.iter().map(|p| p.slots()).collect();
    let schema = Arc::new(
        DiagnosticSchema::builder()
            .extend(declared.iter().flatten().cloned())
            .build()
            .unwrap(),
    );
    assert_eq!(schema.column_names(), ["count", "weighted", "clock"]);

    let grid = RadialGrid::new(8, 5).unwrap();
    let eta: Vec<f64> = (0..8).map(|s| if s < 5 { 1.0 } else { 0.5 }).collect();
    let data = Temperature(vec![2.0; 8]);
    let pool = ThreadPoolBuilder::new().num_threads(2).build().unwrap();

    let mut total = DiagnosticRecord::new(schema.clone());
    for r in 0..2u32 {
        let own = RadialOwnership::new(grid, 2, Rank(r)).unwrap();
        let ctx = FillContext::new(&own, &eta, &data, &pool, CycleId(3), 1.5);
        let mut rec = DiagnosticRecord::new(schema.clone());
        for (p, slots) in producers.iter().zip(&declared) {
            p.fill(&ctx, &mut SlotWriter::new(&mut rec, p.name(), slots))
                .unwrap();
        }
        for (t, v) in total.as_mut_slice().iter_mut().zip(rec.as_slice()) {
            *t += v;
        }
    }

    assert_eq!(total.value("count"), Some(8.0));
    // 5 inner shells at 2.0 and 3 mantle shells at 1.0.
    assert_eq!(total.value("weighted"), Some(13.0));
    // Only the root contributes the clock, so it survives the sum.
    assert_eq!(total.value("clock"), Some(1.5));
}
