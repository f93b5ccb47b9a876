//! Solver-facing arrays computed once at startup.

use dynamo_core::{ParameterSet, RadialGrid};
use log::info;

use crate::config::{ConfigError, RunConfig};

/// Per-shell coefficient arrays handed to the solver.
///
/// Built once, before the first cycle, then shared read-only (wrap it in
/// an `Arc` to hand it to both the solver and the pipeline). Every
/// array covers all NR shells regardless of ownership, and every rank
/// computes identical contents from identical inputs.
///
/// # Examples
///
/// ```
/// use dynamo_core::{ParameterSet, RadialGrid};
/// use dynamo_engine::{RunConfig, SolverCoefficients};
/// use dynamo_radial::ProfileKind;
///
/// let mut cfg = RunConfig::new(RadialGrid::new(10, 6).unwrap());
/// cfg.profile = ProfileKind::mantle_step();
/// let params = ParameterSet::parse_str("etam = 0.01").unwrap();
/// let coeffs = SolverCoefficients::build(&cfg, &params, None).unwrap();
/// assert_eq!(
///     coeffs.diffusivity(),
///     &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 0.01, 0.01]
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SolverCoefficients {
    grid: RadialGrid,
    profile: String,
    diffusivity: Vec<f64>,
    degrees: Option<Vec<u32>>,
}

impl SolverCoefficients {
    /// Resolve the configured profile against `params` and populate
    /// every array.
    ///
    /// `radii` gives the radius of each shell and is required only when
    /// variable truncation is enabled.
    pub fn build(
        config: &RunConfig,
        params: &ParameterSet,
        radii: Option<&[f64]>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = config.grid;
        let profile = config.profile.build(params)?;
        let diffusivity = profile.generate(config.base_diffusivity, &grid)?;

        let degrees = match &config.truncation {
            None => None,
            Some(t) => {
                let radii = radii.ok_or(ConfigError::MissingRadii)?;
                if radii.len() != grid.shell_count() {
                    return Err(ConfigError::RadiiLength {
                        expected: grid.shell_count(),
                        found: radii.len(),
                    });
                }
                Some(t.build()?.generate(radii)?)
            }
        };

        info!(
            "coefficients: NR={} NM={} profile={} base={} truncation={}",
            grid.shell_count(),
            grid.boundary(),
            profile.name(),
            config.base_diffusivity,
            if degrees.is_some() { "variable" } else { "off" },
        );

        Ok(Self {
            grid,
            profile: profile.name().to_string(),
            diffusivity,
            degrees,
        })
    }

    /// The grid the arrays cover.
    pub fn grid(&self) -> RadialGrid {
        self.grid
    }

    /// Name of the profile that produced [`diffusivity`](Self::diffusivity).
    pub fn profile_name(&self) -> &str {
        &self.profile
    }

    /// Diffusivity of every shell.
    pub fn diffusivity(&self) -> &[f64] {
        &self.diffusivity
    }

    /// Maximum harmonic degree of every shell, if variable truncation
    /// is enabled.
    pub fn degrees(&self) -> Option<&[u32]> {
        self.degrees.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TruncationConfig;
    use dynamo_radial::{ProfileError, ProfileKind};

    fn mantle_config() -> RunConfig {
        let mut cfg = RunConfig::new(RadialGrid::new(10, 6).unwrap());
        cfg.profile = ProfileKind::mantle_step();
        cfg
    }

    #[test]
    fn uniform_by_default() {
        let cfg = RunConfig::new(RadialGrid::new(4, 2).unwrap());
        let c = SolverCoefficients::build(&cfg, &ParameterSet::new(), None).unwrap();
        assert_eq!(c.diffusivity(), &[1.0; 4]);
        assert_eq!(c.profile_name(), "uniform");
        assert!(c.degrees().is_none());
    }

    #[test]
    fn absent_factor_zeroes_the_mantle() {
        let c = SolverCoefficients::build(&mantle_config(), &ParameterSet::new(), None).unwrap();
        assert_eq!(&c.diffusivity()[..6], &[1.0; 6]);
        assert_eq!(&c.diffusivity()[6..], &[0.0; 4]);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let params: ParameterSet = [("etam", 0.3)].into_iter().collect();
        let a = SolverCoefficients::build(&mantle_config(), &params, None).unwrap();
        let b = SolverCoefficients::build(&mantle_config(), &params, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn truncation_requires_radii() {
        let mut cfg = mantle_config();
        cfg.truncation = Some(TruncationConfig {
            lmax: 32,
            var_ltr: 0.5,
        });
        let params = ParameterSet::new();
        assert_eq!(
            SolverCoefficients::build(&cfg, &params, None),
            Err(ConfigError::MissingRadii)
        );
        assert_eq!(
            SolverCoefficients::build(&cfg, &params, Some(&[1.0; 3])),
            Err(ConfigError::RadiiLength {
                expected: 10,
                found: 3
            })
        );
        let radii: Vec<f64> = (1..=10).map(|i| i as f64 / 10.0).collect();
        let c = SolverCoefficients::build(&cfg, &params, Some(&radii)).unwrap();
        let degrees = c.degrees().unwrap();
        assert_eq!(degrees.len(), 10);
        assert!(degrees.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(degrees[9], 32);
    }

    #[test]
    fn invalid_config_is_rejected_before_building() {
        let mut cfg = mantle_config();
        cfg.profile = ProfileKind::Tabulated(vec![1.0; 3]);
        assert_eq!(
            SolverCoefficients::build(&cfg, &ParameterSet::new(), None),
            Err(ConfigError::Profile(ProfileError::TableLength {
                expected: 10,
                found: 3
            }))
        );
    }
}
