//! Radius-dependent spherical-harmonic truncation.

use crate::error::ProfileError;

/// Per-shell maximum harmonic degree that shrinks toward the centre.
///
/// `l(r) = min(lmax, floor(lmax * sqrt(r / (r_max * var_ltr))) + 1)`.
/// With `var_ltr = 0.5`, every shell with `r >= r_max / 2` keeps the
/// full `lmax`. Like the diffusivity array, the result covers all
/// shells and is identical on every rank.
///
/// # Examples
///
/// ```
/// use dynamo_radial::VariableTruncation;
///
/// let vt = VariableTruncation::new(100, 0.5).unwrap();
/// let radii = [0.0, 0.125, 0.5, 1.0];
/// assert_eq!(vt.generate(&radii).unwrap(), [1, 51, 100, 100]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VariableTruncation {
    lmax: u32,
    var_ltr: f64,
}

impl VariableTruncation {
    /// `lmax >= 1`; `var_ltr` finite and positive.
    pub fn new(lmax: u32, var_ltr: f64) -> Result<Self, ProfileError> {
        if lmax == 0 {
            return Err(ProfileError::InvalidTruncation {
                reason: "lmax must be at least 1".to_string(),
            });
        }
        if !var_ltr.is_finite() || var_ltr <= 0.0 {
            return Err(ProfileError::InvalidTruncation {
                reason: format!("var_ltr must be finite and positive, got {var_ltr}"),
            });
        }
        Ok(Self { lmax, var_ltr })
    }

    /// The global truncation degree.
    pub fn lmax(&self) -> u32 {
        self.lmax
    }

    /// Truncation degree at radius `r` for an outer radius `r_max`.
    pub fn degree_at(&self, r: f64, r_max: f64) -> u32 {
        let scaled = f64::from(self.lmax) * (r / (r_max * self.var_ltr)).sqrt();
        let l = scaled.floor() + 1.0;
        if l >= f64::from(self.lmax) {
            self.lmax
        } else {
            l as u32
        }
    }

    /// Truncation degree of every shell given the shell radii.
    ///
    /// Radii must be finite and non-negative, with a positive maximum.
    pub fn generate(&self, radii: &[f64]) -> Result<Vec<u32>, ProfileError> {
        if let Some(bad) = radii.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(ProfileError::InvalidTruncation {
                reason: format!("radius must be finite and non-negative, got {bad}"),
            });
        }
        let r_max = radii.iter().copied().fold(0.0, f64::max);
        if r_max <= 0.0 {
            return Err(ProfileError::InvalidTruncation {
                reason: "outer radius must be positive".to_string(),
            });
        }
        Ok(radii.iter().map(|&r| self.degree_at(r, r_max)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameters_rejected() {
        assert!(VariableTruncation::new(0, 0.5).is_err());
        assert!(VariableTruncation::new(10, 0.0).is_err());
        assert!(VariableTruncation::new(10, f64::NAN).is_err());
    }

    #[test]
    fn invalid_radii_rejected() {
        let vt = VariableTruncation::new(10, 0.5).unwrap();
        assert!(vt.generate(&[0.0, -1.0]).is_err());
        assert!(vt.generate(&[0.0, 0.0]).is_err());
        assert!(vt.generate(&[]).is_err());
    }

    #[test]
    fn non_decreasing_and_capped() {
        let vt = VariableTruncation::new(64, 0.7).unwrap();
        let radii: Vec<f64> = (0..50).map(|i| 0.35 + i as f64 * 0.013).collect();
        let l = vt.generate(&radii).unwrap();
        assert!(l.windows(2).all(|w| w[0] <= w[1]));
        assert!(l.iter().all(|&d| (1..=64).contains(&d)));
        assert_eq!(*l.last().unwrap(), 64);
    }

    #[test]
    fn centre_keeps_degree_one() {
        let vt = VariableTruncation::new(32, 1.0).unwrap();
        assert_eq!(vt.degree_at(0.0, 1.0), 1);
    }
}
