//! Scheduling-independent parallel evaluation over shell ranges.
//!
//! Floating-point addition is not associative, so a rayon `sum()` can
//! round differently depending on how work was split. These helpers
//! evaluate per-shell values in parallel but always combine them
//! sequentially in ascending shell order, so the result is the same
//! for any thread count.

use std::ops::Range;

use rayon::prelude::*;
use rayon::ThreadPool;

/// Evaluate `f` for every shell in `shells` on `pool`, returning the
/// values in shell order.
pub fn ordered_map<F>(pool: &ThreadPool, shells: Range<usize>, f: F) -> Vec<f64>
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    pool.install(|| shells.into_par_iter().map(f).collect())
}

/// Sum `f` over `shells`, evaluated on `pool` and combined in shell
/// order.
pub fn ordered_sum<F>(pool: &ThreadPool, shells: Range<usize>, f: F) -> f64
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    ordered_map(pool, shells, f)
        .into_iter()
        .fold(0.0, |acc, v| acc + v)
}

/// Sum `f` over `shells` into `N` bins chosen by `bin`, combined in
/// shell order. Shells whose bin is `>= N` are dropped.
pub fn ordered_binned_sum<const N: usize, F, B>(
    pool: &ThreadPool,
    shells: Range<usize>,
    f: F,
    bin: B,
) -> [f64; N]
where
    F: Fn(usize) -> f64 + Sync + Send,
    B: Fn(usize) -> usize,
{
    let start = shells.start;
    let values = ordered_map(pool, shells, f);
    let mut out = [0.0; N];
    for (offset, v) in values.into_iter().enumerate() {
        if let Some(slot) = out.get_mut(bin(start + offset)) {
            *slot += v;
        }
    }
    out
}
