//! Per-shell diffusivity profiles.
//!
//! A profile maps every shell of the grid to a diffusivity value
//! derived from a base value. Profiles are immutable once built: any
//! parameter lookups happen in the constructor, so evaluating a profile
//! is a pure function of `(shell, base, grid)` and repeated calls
//! always produce the same array.

use dynamo_core::{ParameterSet, RadialGrid};
use log::{info, warn};

use crate::error::ProfileError;

/// Parameter name holding the mantle diffusivity ratio.
pub const DEFAULT_MANTLE_KEY: &str = "etam";

/// A rule mapping shell index to diffusivity.
///
/// # Contract
///
/// - [`fill`](Self::fill) writes every one of the NR entries or fails
///   without writing a partial result visible to the caller's solver
///   (the caller's buffer is untouched on error).
/// - Output depends only on `(base, grid)` and the profile's own
///   construction-time state.
/// - Ownership plays no part: every process produces the full array.
///
/// # Examples
///
/// ```
/// use dynamo_core::{ParameterSet, RadialGrid};
/// use dynamo_radial::{DiffusivityProfile, MantleStep};
///
/// let grid = RadialGrid::new(10, 6).unwrap();
/// let params: ParameterSet = [("etam", 0.01)].into_iter().collect();
/// let profile = MantleStep::from_params(&params, "etam");
/// let eta = profile.generate(1.0, &grid).unwrap();
/// assert_eq!(eta, [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 0.01, 0.01]);
/// ```
pub trait DiffusivityProfile: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Diffusivity of a single shell.
    fn value_at(&self, shell: usize, base: f64, grid: &RadialGrid) -> f64;

    /// Populate `out` with the full profile.
    ///
    /// Fails if `base` is not finite or `out.len() != NR`.
    fn fill(&self, base: f64, grid: &RadialGrid, out: &mut [f64]) -> Result<(), ProfileError> {
        check_fill(base, grid, out)?;
        for (shell, v) in out.iter_mut().enumerate() {
            *v = self.value_at(shell, base, grid);
        }
        Ok(())
    }

    /// Allocate and populate the full profile.
    fn generate(&self, base: f64, grid: &RadialGrid) -> Result<Vec<f64>, ProfileError> {
        let mut out = vec![0.0; grid.shell_count()];
        self.fill(base, grid, &mut out)?;
        Ok(out)
    }
}

fn check_fill(base: f64, grid: &RadialGrid, out: &[f64]) -> Result<(), ProfileError> {
    if !base.is_finite() {
        return Err(ProfileError::NonFiniteBase { value: base });
    }
    if out.len() != grid.shell_count() {
        return Err(ProfileError::LengthMismatch {
            expected: grid.shell_count(),
            found: out.len(),
        });
    }
    Ok(())
}

/// Resolve `key` once, warning if it falls back to the default.
fn resolve_factor(params: &ParameterSet, key: &str) -> f64 {
    match params.try_get(key) {
        Some(v) => v,
        None => {
            warn!(
                "parameter '{key}' not set; mantle factor defaults to {} \
                 and the outer region diffusivity becomes {}",
                ParameterSet::DEFAULT_VALUE,
                ParameterSet::DEFAULT_VALUE,
            );
            ParameterSet::DEFAULT_VALUE
        }
    }
}

// ── Uniform ─────────────────────────────────────────────────────

/// Every shell gets the base value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Uniform;

impl DiffusivityProfile for Uniform {
    fn name(&self) -> &str {
        "uniform"
    }

    fn value_at(&self, _shell: usize, base: f64, _grid: &RadialGrid) -> f64 {
        base
    }
}

// ── MantleStep ──────────────────────────────────────────────────

/// Step function at the boundary shell.
///
/// Shells below NM keep the base value; shells at or above NM get
/// `base * factor`. A factor of `0.0` (including the fallback for an
/// absent parameter) makes the outer region exactly zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MantleStep {
    factor: f64,
}

impl MantleStep {
    /// A step with an explicit factor.
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    /// Read the factor from `params[key]` once and keep it for the run.
    pub fn from_params(params: &ParameterSet, key: &str) -> Self {
        Self::new(resolve_factor(params, key))
    }

    /// The resolved scaling factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl DiffusivityProfile for MantleStep {
    fn name(&self) -> &str {
        "mantle_step"
    }

    fn value_at(&self, shell: usize, base: f64, grid: &RadialGrid) -> f64 {
        if grid.is_inner(shell) {
            base
        } else {
            base * self.factor
        }
    }
}

// ── SmoothStep ──────────────────────────────────────────────────

/// Continuous tanh transition from `base` to `base * factor`.
///
/// The midpoint sits halfway between shells `NM - 1` and `NM`; `width`
/// is measured in shells. As `width -> 0` this approaches
/// [`MantleStep`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothStep {
    factor: f64,
    width: f64,
}

impl SmoothStep {
    /// Build a smooth step. `width` must be finite and positive.
    pub fn new(factor: f64, width: f64) -> Result<Self, ProfileError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(ProfileError::InvalidWidth { value: width });
        }
        Ok(Self { factor, width })
    }

    /// Read the factor from `params[key]` once; `width` is given directly.
    pub fn from_params(params: &ParameterSet, key: &str, width: f64) -> Result<Self, ProfileError> {
        Self::new(resolve_factor(params, key), width)
    }
}

impl DiffusivityProfile for SmoothStep {
    fn name(&self) -> &str {
        "smooth_step"
    }

    fn value_at(&self, shell: usize, base: f64, grid: &RadialGrid) -> f64 {
        let centre = grid.boundary() as f64 - 0.5;
        let s = 0.5 * (1.0 + ((shell as f64 - centre) / self.width).tanh());
        base * (1.0 + (self.factor - 1.0) * s)
    }
}

// ── Tabulated ───────────────────────────────────────────────────

/// Arbitrary per-shell multiplier table: `eta[i] = base * table[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tabulated {
    multipliers: Vec<f64>,
}

impl Tabulated {
    /// Build from a multiplier per shell. The length is checked against
    /// the grid when the profile is filled.
    pub fn new(multipliers: Vec<f64>) -> Self {
        Self { multipliers }
    }

    /// The multiplier table.
    pub fn multipliers(&self) -> &[f64] {
        &self.multipliers
    }
}

impl DiffusivityProfile for Tabulated {
    fn name(&self) -> &str {
        "tabulated"
    }

    fn value_at(&self, shell: usize, base: f64, _grid: &RadialGrid) -> f64 {
        self.multipliers.get(shell).map_or(base, |m| base * m)
    }

    fn fill(&self, base: f64, grid: &RadialGrid, out: &mut [f64]) -> Result<(), ProfileError> {
        if self.multipliers.len() != grid.shell_count() {
            return Err(ProfileError::TableLength {
                expected: grid.shell_count(),
                found: self.multipliers.len(),
            });
        }
        check_fill(base, grid, out)?;
        for (v, m) in out.iter_mut().zip(&self.multipliers) {
            *v = base * m;
        }
        Ok(())
    }
}

// ── ProfileKind ─────────────────────────────────────────────────

/// Profile strategy selected by run configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ProfileKind {
    /// [`Uniform`].
    #[default]
    Uniform,
    /// [`MantleStep`] with the factor read from `key`.
    MantleStep {
        /// Parameter name of the scaling factor.
        key: String,
    },
    /// [`SmoothStep`] with the factor read from `key`.
    SmoothStep {
        /// Parameter name of the scaling factor.
        key: String,
        /// Transition width in shells.
        width: f64,
    },
    /// [`Tabulated`] with the given multipliers.
    Tabulated(Vec<f64>),
}

impl ProfileKind {
    /// The mantle step reading [`DEFAULT_MANTLE_KEY`].
    pub fn mantle_step() -> Self {
        Self::MantleStep {
            key: DEFAULT_MANTLE_KEY.to_string(),
        }
    }

    /// Resolve parameters and build the profile.
    pub fn build(&self, params: &ParameterSet) -> Result<Box<dyn DiffusivityProfile>, ProfileError> {
        let profile: Box<dyn DiffusivityProfile> = match self {
            Self::Uniform => Box::new(Uniform),
            Self::MantleStep { key } => Box::new(MantleStep::from_params(params, key)),
            Self::SmoothStep { key, width } => {
                Box::new(SmoothStep::from_params(params, key, *width)?)
            }
            Self::Tabulated(table) => Box::new(Tabulated::new(table.clone())),
        };
        info!("diffusivity profile: {}", profile.name());
        Ok(profile)
    }
}
