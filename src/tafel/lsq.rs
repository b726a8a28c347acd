use serde::Serialize;

use crate::error::{EchemError, Result};
use crate::regression::{linear_fit, FitResult};

/// Least-squares Tafel line.
#[derive(Debug, Clone, Serialize)]
pub struct LsqTafelFit {
    /// `|1000 / m|` in mV/decade.
    pub slope_mv_per_decade: f64,
    pub r_squared: f64,
    pub fit_potential: Vec<f64>,
    pub fit_log_current: Vec<f64>,
    pub line: FitResult,
}

/// Fit `log10(I) = m E + b` and report the Tafel slope `|1000 / m|`.
///
/// ```
/// use echem_fit::tafel::fit_tafel_slope_lsq;
///
/// let e: Vec<f64> = (0..10).map(|k| 0.01 * k as f64).collect();
/// let log_i: Vec<f64> = e.iter().map(|v| 1000.0 / 120.0 * v).collect();
/// let fit = fit_tafel_slope_lsq(&e, &log_i).unwrap();
/// assert!((fit.slope_mv_per_decade - 120.0).abs() < 1e-6);
/// ```
pub fn fit_tafel_slope_lsq(potential: &[f64], log_current: &[f64]) -> Result<LsqTafelFit> {
    let line = linear_fit(potential, log_current, None, None)?;
    if line.slope == 0.0 {
        return Err(EchemError::InputShape(
            "log-current does not change with potential".to_string(),
        ));
    }

    let fit_log_current = potential.iter().map(|&e| line.predict(e)).collect();
    Ok(LsqTafelFit {
        slope_mv_per_decade: (1000.0 / line.slope).abs(),
        r_squared: line.r_squared,
        fit_potential: potential.to_vec(),
        fit_log_current,
        line,
    })
}
