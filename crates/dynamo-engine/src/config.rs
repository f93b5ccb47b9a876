//! Run configuration, validation, and error types.
//!
//! [`RunConfig`] selects at startup everything that would otherwise be
//! a compile-time toggle: the diffusivity profile, the optional
//! variable truncation, the enabled diagnostics and the intra-rank
//! thread count. [`validate()`](RunConfig::validate) checks the
//! structural invariants that do not need the parameter set or the
//! process group.

use std::error::Error;
use std::fmt;

use dynamo_comm::CommError;
use dynamo_core::RadialGrid;
use dynamo_diag::{ProducerSpec, RegistryError, SchemaError};
use dynamo_radial::{OwnershipError, ProfileError, ProfileKind, SmoothStep, VariableTruncation};

// ── TruncationConfig ───────────────────────────────────────────────

/// Radius-dependent truncation settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TruncationConfig {
    /// Global maximum harmonic degree.
    pub lmax: u32,
    /// Fraction of the outer radius above which `lmax` applies in full.
    pub var_ltr: f64,
}

impl TruncationConfig {
    /// Build the truncation rule, validating the parameters.
    pub fn build(&self) -> Result<VariableTruncation, ProfileError> {
        VariableTruncation::new(self.lmax, self.var_ltr)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`RunConfig`] or assembling a
/// pipeline from it.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The rank cannot be placed in the process group.
    Ownership(OwnershipError),
    /// The diffusivity profile or truncation is invalid.
    Profile(ProfileError),
    /// The diagnostic slots do not form a valid schema.
    Schema(SchemaError),
    /// A configured producer could not be built.
    Registry(RegistryError),
    /// The startup handshake with the process group failed.
    Comm(CommError),
    /// `base_diffusivity` is NaN or infinite.
    NonFiniteBase {
        /// The rejected value.
        value: f64,
    },
    /// Variable truncation is enabled but no shell radii were given.
    MissingRadii,
    /// Shell radii do not cover every shell.
    RadiiLength {
        /// Number of shells.
        expected: usize,
        /// Number of radii supplied.
        found: usize,
    },
    /// The rayon pool for the Local Fill could not be created.
    ThreadPool {
        /// Description from rayon.
        reason: String,
    },
    /// Ranks disagree on the diagnostic slot layout.
    SchemaMismatch {
        /// This rank's schema fingerprint.
        fingerprint: u64,
    },
    /// Another rank could not build its pipeline.
    PeerFailed {
        /// Number of ranks that failed.
        failures: u64,
    },
    /// Ranks disagree on the radial grid.
    GridMismatch {
        /// This rank's shell count.
        shell_count: usize,
        /// This rank's boundary index.
        boundary: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ownership(e) => write!(f, "ownership: {e}"),
            Self::Profile(e) => write!(f, "profile: {e}"),
            Self::Schema(e) => write!(f, "schema: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Comm(e) => write!(f, "process group: {e}"),
            Self::NonFiniteBase { value } => {
                write!(f, "base_diffusivity must be finite, got {value}")
            }
            Self::MissingRadii => {
                write!(f, "variable truncation is enabled but no shell radii were given")
            }
            Self::RadiiLength { expected, found } => {
                write!(f, "got {found} shell radii, expected {expected}")
            }
            Self::ThreadPool { reason } => write!(f, "fill thread pool: {reason}"),
            Self::SchemaMismatch { fingerprint } => write!(
                f,
                "diagnostic schema {fingerprint:#018x} differs from another rank's"
            ),
            Self::PeerFailed { failures } => {
                write!(f, "{failures} rank(s) failed to build their pipeline")
            }
            Self::GridMismatch {
                shell_count,
                boundary,
            } => write!(
                f,
                "grid NR={shell_count} NM={boundary} differs from another rank's"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ownership(e) => Some(e),
            Self::Profile(e) => Some(e),
            Self::Schema(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Comm(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OwnershipError> for ConfigError {
    fn from(e: OwnershipError) -> Self {
        Self::Ownership(e)
    }
}

impl From<ProfileError> for ConfigError {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

impl From<SchemaError> for ConfigError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl From<RegistryError> for ConfigError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<CommError> for ConfigError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

// ── RunConfig ──────────────────────────────────────────────────────

/// Complete startup configuration for one rank.
///
/// Every rank must be given the same configuration; the pipeline
/// verifies the grid and diagnostic layout with its peers when it is
/// constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Radial grid (NR shells, boundary NM).
    pub grid: RadialGrid,
    /// Diffusivity before any profile scaling.
    pub base_diffusivity: f64,
    /// Shape of the diffusivity profile. Default: uniform.
    pub profile: ProfileKind,
    /// Radius-dependent truncation, if enabled.
    pub truncation: Option<TruncationConfig>,
    /// Enabled diagnostics, in log column order.
    pub diagnostics: Vec<ProducerSpec>,
    /// Threads for the Local Fill. `None` = rayon's default.
    pub fill_threads: Option<usize>,
    /// Write a `% t col...` header line when the log is attached.
    pub log_header: bool,
}

impl RunConfig {
    /// A configuration with base diffusivity 1, a uniform profile, no
    /// truncation and no diagnostics.
    pub fn new(grid: RadialGrid) -> Self {
        Self {
            grid,
            base_diffusivity: 1.0,
            profile: ProfileKind::default(),
            truncation: None,
            diagnostics: Vec::new(),
            fill_threads: None,
            log_header: false,
        }
    }

    /// Thread count for the Local Fill pool.
    ///
    /// Explicit values are clamped to `[1, 64]`; `None` is passed through
    /// so rayon picks its default.
    pub fn resolved_fill_threads(&self) -> Option<usize> {
        self.fill_threads.map(|n| n.clamp(1, 64))
    }

    /// Validate everything that can be checked without the parameter
    /// set or the process group.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Base diffusivity must be finite.
        if !self.base_diffusivity.is_finite() {
            return Err(ConfigError::NonFiniteBase {
                value: self.base_diffusivity,
            });
        }
        // 2. Profile shape parameters.
        match &self.profile {
            ProfileKind::SmoothStep { width, .. } => {
                SmoothStep::new(0.0, *width)?;
            }
            ProfileKind::Tabulated(table) => {
                if table.len() != self.grid.shell_count() {
                    return Err(ProfileError::TableLength {
                        expected: self.grid.shell_count(),
                        found: table.len(),
                    }
                    .into());
                }
            }
            ProfileKind::Uniform | ProfileKind::MantleStep { .. } => {}
        }
        // 3. Truncation parameters.
        if let Some(t) = &self.truncation {
            t.build()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RunConfig {
        RunConfig {
            profile: ProfileKind::mantle_step(),
            truncation: Some(TruncationConfig {
                lmax: 64,
                var_ltr: 0.5,
            }),
            diagnostics: vec![ProducerSpec::new("shell_count")],
            ..RunConfig::new(RadialGrid::new(10, 6).unwrap())
        }
    }

    #[test]
    fn validate_valid_config_succeeds() {
        assert!(valid_config().validate().is_ok());
        assert!(RunConfig::new(RadialGrid::new(1, 0).unwrap())
            .validate()
            .is_ok());
    }

    #[test]
    fn validate_non_finite_base_fails() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut cfg = valid_config();
            cfg.base_diffusivity = bad;
            match cfg.validate() {
                Err(ConfigError::NonFiniteBase { .. }) => {}
                other => panic!("expected NonFiniteBase, got {other:?}"),
            }
        }
    }

    #[test]
    fn validate_smooth_step_width() {
        let mut cfg = valid_config();
        cfg.profile = ProfileKind::SmoothStep {
            key: "etam".into(),
            width: 0.0,
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Profile(ProfileError::InvalidWidth { value: 0.0 }))
        );
    }

    #[test]
    fn validate_table_length() {
        let mut cfg = valid_config();
        cfg.profile = ProfileKind::Tabulated(vec![1.0; 9]);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Profile(ProfileError::TableLength {
                expected: 10,
                found: 9
            }))
        );
    }

    #[test]
    fn validate_truncation() {
        let mut cfg = valid_config();
        cfg.truncation = Some(TruncationConfig {
            lmax: 0,
            var_ltr: 0.5,
        });
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Profile(ProfileError::InvalidTruncation { .. }))
        ));
    }

    #[test]
    fn fill_threads_clamped() {
        let mut cfg = valid_config();
        assert_eq!(cfg.resolved_fill_threads(), None);
        cfg.fill_threads = Some(0);
        assert_eq!(cfg.resolved_fill_threads(), Some(1));
        cfg.fill_threads = Some(1000);
        assert_eq!(cfg.resolved_fill_threads(), Some(64));
        cfg.fill_threads = Some(8);
        assert_eq!(cfg.resolved_fill_threads(), Some(8));
    }

    #[test]
    fn error_sources_chain() {
        let e = ConfigError::from(RegistryError::UnknownProducer {
            name: "x".into(),
        });
        assert!(e.source().is_some());
        assert!(e.to_string().contains("registry"));
        assert!(ConfigError::MissingRadii.source().is_none());
    }
}
