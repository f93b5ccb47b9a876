//! Criterion micro-benchmarks for ownership queries and profile fills.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dynamo_core::{ParameterSet, RadialGrid, Rank};
use dynamo_radial::{DiffusivityProfile, MantleStep, ProfileKind, RadialOwnership, SmoothStep};

/// Benchmark: owner_of() for every shell of a 4097-shell grid over 64 ranks.
fn bench_owner_of_4k(c: &mut Criterion) {
    let grid = RadialGrid::new(4097, 3072).unwrap();
    let own = RadialOwnership::new(grid, 64, Rank(17)).unwrap();

    c.bench_function("owner_of_4k", |b| {
        b.iter(|| {
            for s in 0..4097 {
                black_box(own.owner_of(s));
            }
        });
    });
}

/// Benchmark: build ownership maps for every rank of a 64-rank group.
fn bench_ownership_new_64(c: &mut Criterion) {
    let grid = RadialGrid::new(4097, 3072).unwrap();

    c.bench_function("ownership_new_64", |b| {
        b.iter(|| {
            for r in 0..64u32 {
                black_box(RadialOwnership::new(grid, 64, Rank(r)).unwrap());
            }
        });
    });
}

/// Benchmark: fill a 4097-entry diffusivity array with the mantle step.
fn bench_mantle_step_fill_4k(c: &mut Criterion) {
    let grid = RadialGrid::new(4097, 3072).unwrap();
    let profile = MantleStep::new(0.01);
    let mut out = vec![0.0; 4097];

    c.bench_function("mantle_step_fill_4k", |b| {
        b.iter(|| {
            profile.fill(black_box(1.0), &grid, &mut out).unwrap();
            black_box(&out);
        });
    });
}

/// Benchmark: fill a 4097-entry diffusivity array with the smooth step.
fn bench_smooth_step_fill_4k(c: &mut Criterion) {
    let grid = RadialGrid::new(4097, 3072).unwrap();
    let profile = SmoothStep::new(0.01, 8.0).unwrap();
    let mut out = vec![0.0; 4097];

    c.bench_function("smooth_step_fill_4k", |b| {
        b.iter(|| {
            profile.fill(black_box(1.0), &grid, &mut out).unwrap();
            black_box(&out);
        });
    });
}

/// Benchmark: resolve a profile kind against a parameter set.
fn bench_profile_kind_build(c: &mut Criterion) {
    let params = ParameterSet::parse_str("etam = 0.01\nra = 1e6\nek = 1e-4").unwrap();
    let kind = ProfileKind::mantle_step();

    c.bench_function("profile_kind_build", |b| {
        b.iter(|| black_box(kind.build(&params).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_owner_of_4k,
    bench_ownership_new_64,
    bench_mantle_step_fill_4k,
    bench_smooth_step_fill_4k,
    bench_profile_kind_build
);
criterion_main!(benches);
