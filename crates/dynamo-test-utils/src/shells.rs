//! Mock per-shell solver state.

use std::collections::HashMap;

use dynamo_core::ShellData;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// In-memory [`ShellData`] backed by named `Vec<f64>` quantities.
///
/// Every rank of a test group should build the same instance (same
/// seed), just as every solver rank holds the same global arrays.
#[derive(Clone, Debug, Default)]
pub struct MockShellData {
    shell_count: usize,
    quantities: HashMap<String, Vec<f64>>,
    radii: Option<Vec<f64>>,
}

impl MockShellData {
    pub fn new(shell_count: usize) -> Self {
        Self {
            shell_count,
            quantities: HashMap::new(),
            radii: None,
        }
    }

    /// `name[s] = s` for every shell.
    pub fn ramp(shell_count: usize, name: &str) -> Self {
        let mut data = Self::new(shell_count);
        data.set_quantity(name, (0..shell_count).map(|s| s as f64).collect());
        data
    }

    /// One uniformly random quantity in `[0, 1)` per name, from a
    /// seeded ChaCha8 stream so every rank sees the same values.
    pub fn random(shell_count: usize, names: &[&str], seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut data = Self::new(shell_count);
        for name in names {
            let values = (0..shell_count).map(|_| unit_f64(&mut rng)).collect();
            data.set_quantity(name, values);
        }
        data
    }

    /// Pre-populate a quantity. Its length is not checked, so tests can
    /// supply short arrays on purpose.
    pub fn set_quantity(&mut self, name: &str, values: Vec<f64>) {
        self.quantities.insert(name.to_string(), values);
    }

    /// Equally spaced radii from `inner` to `outer`.
    pub fn with_radii(mut self, inner: f64, outer: f64) -> Self {
        let n = self.shell_count;
        let step = if n > 1 {
            (outer - inner) / (n - 1) as f64
        } else {
            0.0
        };
        self.radii = Some((0..n).map(|s| inner + step * s as f64).collect());
        self
    }

    /// The radii, if set.
    pub fn radii(&self) -> Option<&[f64]> {
        self.radii.as_deref()
    }
}

/// 53 random mantissa bits scaled into `[0, 1)`.
fn unit_f64(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

impl ShellData for MockShellData {
    fn shell_count(&self) -> usize {
        self.shell_count
    }

    fn quantity(&self, name: &str) -> Option<&[f64]> {
        self.quantities.get(name).map(|v| v.as_slice())
    }

    fn radius(&self, shell: usize) -> Option<f64> {
        self.radii.as_ref()?.get(shell).copied()
    }
}
