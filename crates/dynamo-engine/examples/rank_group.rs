//! Four ranks, one diagnostic log.
//!
//! Demonstrates:
//!   1. Parsing run parameters and building the solver coefficients
//!   2. Starting an in-process group of ranks on threads
//!   3. Running diagnostic cycles on every rank
//!   4. Reading back the log that only the root wrote
//!
//! Run with:
//!   cargo run --example rank_group

use std::sync::Arc;

use dynamo_comm::LocalComm;
use dynamo_core::{ParameterSet, RadialGrid, ShellData};
use dynamo_diag::{DiagnosticRegistry, ProducerSpec};
use dynamo_engine::{DiagnosticPipeline, RunConfig, SolverCoefficients};
use dynamo_radial::ProfileKind;

// ─── Grid parameters ────────────────────────────────────────────

const NR: usize = 33;
const NM: usize = 24;
const RANKS: usize = 4;
const CYCLES: usize = 5;
const DT: f64 = 0.01;

const PARAMS: &str = "
# mantle-to-core diffusivity ratio
etam = 0.02
";

// ─── Toy solver state ───────────────────────────────────────────
//
// Kinetic energy per shell decays with time; every rank holds the same
// global arrays, as a real spectral solver would.

struct Decaying {
    ke: Vec<f64>,
}

impl Decaying {
    fn at(time: f64) -> Self {
        let ke = (0..NR)
            .map(|s| (1.0 + s as f64).ln() * (-time).exp())
            .collect();
        Self { ke }
    }
}

impl ShellData for Decaying {
    fn shell_count(&self) -> usize {
        NR
    }

    fn quantity(&self, name: &str) -> Option<&[f64]> {
        (name == "ke").then_some(self.ke.as_slice())
    }
}

fn main() {
    let grid = RadialGrid::new(NR, NM).expect("grid");
    let mut config = RunConfig::new(grid);
    config.profile = ProfileKind::mantle_step();
    config.diagnostics = vec![
        ProducerSpec::new("shell_count"),
        ProducerSpec::new("diffusivity_sum"),
        ProducerSpec::new("quantity_sum").with_quantity("ke"),
        ProducerSpec::new("boundary_split").with_quantity("ke"),
    ];
    config.fill_threads = Some(2);
    config.log_header = true;

    let params = ParameterSet::parse_str(PARAMS).expect("parameters");
    let coeffs = Arc::new(SolverCoefficients::build(&config, &params, None).expect("coefficients"));
    println!(
        "profile {} over {NR} shells, boundary at {NM}",
        coeffs.profile_name()
    );

    let path = std::env::temp_dir().join("dynamo_rank_group.log");

    std::thread::scope(|s| {
        for comm in LocalComm::group(RANKS) {
            let config = &config;
            let coeffs = coeffs.clone();
            let path = &path;
            s.spawn(move || {
                let registry = DiagnosticRegistry::with_builtins();
                let mut pipeline =
                    DiagnosticPipeline::new(comm, config, coeffs, &registry).expect("pipeline");
                // Only the root opens the file; rerunning appends below the
                // existing header.
                pipeline.attach_log_file(path).expect("attach log");
                let range = pipeline.ownership().local_range();
                println!("rank {} owns shells {}..{}", pipeline.rank(), range.start, range.end);

                for step in 0..CYCLES {
                    let time = step as f64 * DT;
                    let state = Decaying::at(time);
                    let report = pipeline.run_cycle(time, &state).expect("cycle");
                    if report.appended {
                        println!(
                            "cycle {} t={time}: ke_sum={:.6} ({}us)",
                            report.cycle,
                            report.record.value("ke_sum").unwrap_or(f64::NAN),
                            report.metrics.total_us
                        );
                    }
                }
                pipeline.flush().expect("flush");
            });
        }
    });

    println!("\n{}:", path.display());
    print!("{}", std::fs::read_to_string(&path).expect("read log"));
}
