//! Criterion benchmarks for the Local Fill helpers and full cycles.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dynamo_bench::{coefficients, reference_config, stress_config};
use dynamo_comm::SingleProcess;
use dynamo_diag::parallel::{ordered_binned_sum, ordered_sum};
use dynamo_diag::DiagnosticRegistry;
use dynamo_engine::DiagnosticPipeline;
use dynamo_test_utils::{run_on_ranks, MockShellData};
use rayon::ThreadPoolBuilder;

/// Benchmark: ordered_sum over 4097 shells on 1 and 4 threads.
fn bench_ordered_sum_4k(c: &mut Criterion) {
    let data = MockShellData::random(4097, &["ke"], 42);
    let ke: Vec<f64> = dynamo_core::ShellData::quantity(&data, "ke").unwrap().to_vec();

    for threads in [1, 4] {
        let pool = ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        c.bench_function(&format!("ordered_sum_4k_t{threads}"), |b| {
            b.iter(|| black_box(ordered_sum(&pool, 0..4097, |s| ke[s] * ke[s])));
        });
    }
}

/// Benchmark: inner/outer binned sum over 4097 shells.
fn bench_ordered_binned_sum_4k(c: &mut Criterion) {
    let data = MockShellData::random(4097, &["ke"], 42);
    let ke: Vec<f64> = dynamo_core::ShellData::quantity(&data, "ke").unwrap().to_vec();
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();

    c.bench_function("ordered_binned_sum_4k", |b| {
        b.iter(|| {
            black_box(ordered_binned_sum::<2, _, _>(
                &pool,
                0..4097,
                |s| ke[s],
                |s| usize::from(s >= 3072),
            ))
        });
    });
}

/// Benchmark: one full single-rank cycle on the reference profile.
fn bench_cycle_reference_single(c: &mut Criterion) {
    let cfg = reference_config(2);
    let data = MockShellData::random(129, &["ke"], 7);
    let mut pipeline = DiagnosticPipeline::new(
        SingleProcess,
        &cfg,
        coefficients(&cfg),
        &DiagnosticRegistry::with_builtins(),
    )
    .unwrap();
    let mut t = 0.0;

    c.bench_function("cycle_reference_single", |b| {
        b.iter(|| {
            t += 1.0;
            black_box(pipeline.run_cycle(t, &data).unwrap());
        });
    });
}

/// Benchmark: 20 cycles of the stress profile across 4 in-process ranks,
/// pipeline construction and handshake included.
fn bench_cycles_stress_4_ranks(c: &mut Criterion) {
    let cfg = stress_config(2);
    let coeffs = coefficients(&cfg);
    let data = MockShellData::random(4097, &["ke"], 7);

    let mut group = c.benchmark_group("stress");
    group.sample_size(10);
    group.bench_function("cycles_stress_4_ranks", |b| {
        b.iter(|| {
            run_on_ranks(4, |comm| {
                let mut p = DiagnosticPipeline::new(
                    comm,
                    &cfg,
                    coeffs.clone(),
                    &DiagnosticRegistry::with_builtins(),
                )
                .unwrap();
                for i in 0..20 {
                    black_box(p.run_cycle(i as f64, &data).unwrap());
                }
            })
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_ordered_sum_4k,
    bench_ordered_binned_sum_4k,
    bench_cycle_reference_single,
    bench_cycles_stress_4_ranks
);
criterion_main!(benches);
