//! Faradaic efficiency from a product signal and a calibration line.
//!
//! A calibration line `signal = slope * current + intercept` maps the
//! detector signal of a product (e.g. a GC peak area in mV/min) to the
//! partial current that made it. The efficiency is that partial current as a
//! percentage of the average cell current, usually the median cell current
//! over the injection interval from [`median_current`].

use serde::Serialize;

use crate::error::{ensure_same_len, EchemError, Result};
use crate::regression::{linear_fit, FitResult};
use crate::uncertainty::{statistics, Measurement};

/// `100 * ((signal - cal_intercept) / cal_slope) / avg_current`, in percent.
///
/// All inputs are treated as independent measurements.
///
/// ```
/// use echem_fit::faradaic::faradaic_efficiency;
/// use echem_fit::uncertainty::Measurement;
///
/// let fe = faradaic_efficiency(
///     Measurement::exact(45.0),
///     Measurement::new(10.0, 0.1),
///     Measurement::exact(5.0),
///     Measurement::exact(0.0),
/// )
/// .unwrap();
/// assert!((fe.value - 90.0).abs() < 1e-12);
/// assert!((fe.uncertainty - 0.9).abs() < 1e-12);
/// ```
pub fn faradaic_efficiency(
    signal: Measurement,
    avg_current: Measurement,
    cal_slope: Measurement,
    cal_intercept: Measurement,
) -> Result<Measurement> {
    check_nonzero("calibration slope", cal_slope.value)?;
    check_nonzero("average current", avg_current.value)?;
    let current = (signal - cal_intercept) / cal_slope;
    Ok((current / avg_current).scale(100.0))
}

/// Signal that would give `efficiency` percent; the inverse of
/// [`faradaic_efficiency`] on the central values.
pub fn signal_for_efficiency(efficiency: f64, avg_current: f64, cal_slope: f64, cal_intercept: f64) -> f64 {
    efficiency / 100.0 * avg_current * cal_slope + cal_intercept
}

/// Median cell current over each injection interval of an electrolysis.
///
/// `time` is shifted to start at zero; interval `k` covers
/// `[interval_ends[k - 1], interval_ends[k])`, the first starting at 0.
pub fn median_current(time: &[f64], current: &[f64], interval_ends: &[f64]) -> Result<Vec<f64>> {
    ensure_same_len("time and current", time.len(), current.len())?;
    if time.is_empty() {
        return Err(EchemError::InsufficientData { needed: 1, got: 0 });
    }
    if time.iter().chain(current).chain(interval_ends).any(|v| !v.is_finite()) {
        return Err(EchemError::InputShape(
            "time, current and interval ends must be finite".to_string(),
        ));
    }

    let t0 = time.iter().copied().fold(f64::INFINITY, f64::min);
    let mut start = 0.0;
    let mut medians = Vec::with_capacity(interval_ends.len());
    for &end in interval_ends {
        if end <= start {
            return Err(EchemError::InputShape(format!(
                "interval ends must increase, got {} after {}",
                end, start
            )));
        }
        let inside: Vec<f64> = time
            .iter()
            .zip(current)
            .filter(|(&t, _)| (start..end).contains(&(t - t0)))
            .map(|(_, &i)| i)
            .collect();
        if inside.is_empty() {
            return Err(EchemError::InputShape(format!(
                "no current samples between {} s and {} s",
                start, end
            )));
        }
        medians.push(statistics::median(&inside));
        start = end;
    }
    Ok(medians)
}

fn check_nonzero(what: &str, value: f64) -> Result<()> {
    if value == 0.0 || !value.is_finite() {
        return Err(EchemError::InvalidParameter(format!(
            "{} must be finite and nonzero, got {}",
            what, value
        )));
    }
    Ok(())
}

/// One product measured against a calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProductAnalysis {
    /// Partial current behind the signal (mA).
    pub partial_current: Measurement,
    /// Faradaic efficiency in percent.
    pub efficiency: Measurement,
    /// Partial current per electrode area (mA/cm²).
    pub partial_current_density: Measurement,
}

/// A fitted calibration line with the covariance of its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    pub slope: f64,
    pub intercept: f64,
    /// Covariance of `(slope, intercept)`.
    pub covariance: [[f64; 2]; 2],
}

impl Calibration {
    /// An exactly known line.
    pub fn exact(slope: f64, intercept: f64) -> Self {
        Self {
            slope,
            intercept,
            covariance: [[0.0; 2]; 2],
        }
    }

    pub fn from_fit(fit: &FitResult) -> Self {
        Self {
            slope: fit.slope,
            intercept: fit.intercept,
            covariance: fit.covariance,
        }
    }

    pub fn slope_measurement(&self) -> Measurement {
        Measurement::new(self.slope, self.covariance[0][0].max(0.0).sqrt())
    }

    pub fn intercept_measurement(&self) -> Measurement {
        Measurement::new(self.intercept, self.covariance[1][1].max(0.0).sqrt())
    }

    /// Partial current behind `signal`.
    pub fn current_for_signal(&self, signal: f64) -> Result<f64> {
        check_nonzero("calibration slope", self.slope)?;
        Ok((signal - self.intercept) / self.slope)
    }

    /// Partial current behind `signal`, propagating the calibration covariance.
    pub fn partial_current(&self, signal: Measurement) -> Result<Measurement> {
        let value = self.current_for_signal(signal.value)?;
        let m = self.slope;
        let d_signal = 1.0 / m;
        let d_slope = -value / m;
        let d_intercept = -d_signal;
        let c = &self.covariance;
        let variance = (d_signal * signal.uncertainty).powi(2)
            + d_slope * d_slope * c[0][0]
            + 2.0 * d_slope * d_intercept * c[0][1]
            + d_intercept * d_intercept * c[1][1];
        Ok(Measurement::new(value, variance.max(0.0).sqrt()))
    }

    /// Partial current, efficiency and partial current density of a product.
    pub fn analyze_product(
        &self,
        signal: Measurement,
        avg_current: Measurement,
        area: f64,
    ) -> Result<ProductAnalysis> {
        if !(area.is_finite() && area > 0.0) {
            return Err(EchemError::InvalidParameter(format!(
                "electrode area must be positive, got {}",
                area
            )));
        }
        let partial_current = self.partial_current(signal)?;
        Ok(ProductAnalysis {
            partial_current,
            efficiency: self.efficiency(signal, avg_current)?,
            partial_current_density: partial_current.scale(1.0 / area),
        })
    }

    /// Faradaic efficiency in percent, propagating the slope-intercept
    /// covariance of the calibration.
    pub fn efficiency(&self, signal: Measurement, avg_current: Measurement) -> Result<Measurement> {
        check_nonzero("calibration slope", self.slope)?;
        check_nonzero("average current", avg_current.value)?;

        let (m, b, i) = (self.slope, self.intercept, avg_current.value);
        let net = signal.value - b;
        let value = 100.0 * net / (m * i);

        let d_signal = 100.0 / (m * i);
        let d_current = -value / i;
        let d_slope = -value / m;
        let d_intercept = -d_signal;
        let c = &self.covariance;
        let var_cal = d_slope * d_slope * c[0][0]
            + 2.0 * d_slope * d_intercept * c[0][1]
            + d_intercept * d_intercept * c[1][1];
        let variance = (d_signal * signal.uncertainty).powi(2)
            + (d_current * avg_current.uncertainty).powi(2)
            + var_cal;

        Ok(Measurement::new(value, variance.max(0.0).sqrt()))
    }
}

/// Fit a calibration line of `signal` against `current`.
///
/// With `current_err`, the errors sit on the independent variable and the
/// line is fitted through the axis-swapped path of the regression engine.
pub fn fit_calibration(
    current: &[f64],
    signal: &[f64],
    current_err: Option<&[f64]>,
) -> Result<(Calibration, FitResult)> {
    let fit = linear_fit(current, signal, current_err, None)?;
    log::debug!(
        "calibration slope {:.6e} +/- {:.2e}, intercept {:.6e} +/- {:.2e}",
        fit.slope,
        fit.slope_stderr,
        fit.intercept,
        fit.intercept_stderr
    );
    Ok((Calibration::from_fit(&fit), fit))
}
