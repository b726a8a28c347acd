//! Potential correction to the RHE scale and polarization-curve helpers.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_same_len, EchemError, Result};

/// Reference-electrode offset (V) added when converting to RHE.
pub const REFERENCE_OFFSET: f64 = 0.210;

/// Nernstian slope at room temperature (V per pH unit).
pub const NERNST_SLOPE: f64 = 0.059;

/// `E_rhe = E + reference_offset + nernst_slope * pH - I * Ru / 1000`
///
/// Current is in mA and Ru in mΩ, so `I * Ru / 1000` is in volts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotentialCorrection {
    pub reference_offset: f64,
    pub nernst_slope: f64,
}

impl Default for PotentialCorrection {
    fn default() -> Self {
        Self {
            reference_offset: REFERENCE_OFFSET,
            nernst_slope: NERNST_SLOPE,
        }
    }
}

impl PotentialCorrection {
    pub fn with_reference_offset(mut self, offset: f64) -> Self {
        self.reference_offset = offset;
        self
    }

    pub fn with_nernst_slope(mut self, slope: f64) -> Self {
        self.nernst_slope = slope;
        self
    }

    /// Correct one point.
    pub fn apply_one(&self, potential: f64, current: f64, ph: f64, ru: f64) -> f64 {
        potential + self.reference_offset + self.nernst_slope * ph - current * (ru / 1000.0)
    }

    /// Correct a whole trace element-wise.
    pub fn apply(&self, potential: &[f64], current: &[f64], ph: f64, ru: f64) -> Result<Vec<f64>> {
        ensure_same_len("potential and current", potential.len(), current.len())?;
        Ok(potential
            .iter()
            .zip(current)
            .map(|(&e, &i)| self.apply_one(e, i, ph, ru))
            .collect())
    }
}

/// Convert measured potentials to the RHE scale with the default constants.
///
/// ```
/// use echem_fit::potential::correct_potential;
///
/// let e = correct_potential(&[0.0, -0.1], &[0.0, 0.0], 7.0, 0.0).unwrap();
/// assert_eq!(e[0], 0.0 + 0.210 + 0.059 * 7.0);
/// ```
pub fn correct_potential(potential: &[f64], current: &[f64], ph: f64, ru: f64) -> Result<Vec<f64>> {
    PotentialCorrection::default().apply(potential, current, ph, ru)
}

/// Divide current by a surface area (geometric or electrochemical).
pub fn normalize_current(current: &[f64], area: f64) -> Result<Vec<f64>> {
    if !(area.is_finite() && area > 0.0) {
        return Err(EchemError::InvalidParameter(format!(
            "surface area must be positive, got {}",
            area
        )));
    }
    Ok(current.iter().map(|i| i / area).collect())
}

/// Potential at which the current density reaches `target`, by linear
/// interpolation over the curve sorted by current.
///
/// `None` when every point lies above or below the target.
pub fn potential_at_current_density(
    potential: &[f64],
    current_density: &[f64],
    target: f64,
) -> Result<Option<f64>> {
    ensure_same_len("potential and current density", potential.len(), current_density.len())?;

    let mut order: Vec<usize> = (0..current_density.len()).collect();
    order.sort_by(|&a, &b| current_density[a].total_cmp(&current_density[b]));

    let Some(&first) = order.first() else {
        return Ok(None);
    };
    if current_density[first] > target {
        return Ok(None);
    }

    for w in order.windows(2) {
        let (k0, k1) = (w[0], w[1]);
        let (x0, x1) = (current_density[k0], current_density[k1]);
        if x1 > target {
            if x1 == x0 {
                return Ok(Some(potential[k1]));
            }
            let (y0, y1) = (potential[k0], potential[k1]);
            return Ok(Some(y1 + (target - x1) * (y0 - y1) / (x0 - x1)));
        }
    }
    Ok(None)
}
