//! Electrochemical surface area from double-layer capacitance.
//!
//! Branch currents at a fixed potential grow linearly with scan rate; the
//! slope is the double-layer capacitance. With current in mA and scan rate in
//! mV/s the slope is in mA·s/mV (= F). The result is
//! `((|slope_low| + |slope_high|) / 2 - blank_capacitance) / specific_capacitance`,
//! so its units follow whatever units `specific_capacitance` carries.

use serde::Serialize;

use crate::contour::{fit_potential_contour, ContourTable};
use crate::error::{EchemError, Result};
use crate::regression::{linear_fit, FitResult};
use crate::trace::ScanFamily;
use crate::uncertainty::Measurement;

/// Default tolerance (V) when comparing sweep windows across a family.
pub const DEFAULT_SWEEP_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct EcsaOptions {
    pub specific_capacitance: f64,
    pub blank_capacitance: f64,
    /// Scan rates left out of both branch fits.
    pub exclude_rates: Vec<f64>,
    pub sweep_tolerance: f64,
}

impl Default for EcsaOptions {
    fn default() -> Self {
        Self {
            specific_capacitance: 1.0,
            blank_capacitance: 0.0,
            exclude_rates: Vec::new(),
            sweep_tolerance: DEFAULT_SWEEP_TOLERANCE,
        }
    }
}

impl EcsaOptions {
    pub fn with_specific_capacitance(mut self, value: f64) -> Self {
        self.specific_capacitance = value;
        self
    }

    pub fn with_blank_capacitance(mut self, value: f64) -> Self {
        self.blank_capacitance = value;
        self
    }

    pub fn with_excluded_rates(mut self, rates: Vec<f64>) -> Self {
        self.exclude_rates = rates;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchFits {
    pub low: FitResult,
    pub high: FitResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct EcsaResult {
    pub value: f64,
    /// First-order uncertainty from the two slope standard errors.
    pub value_stderr: f64,
    /// Mean of the absolute branch slopes before blank subtraction.
    pub double_layer_capacitance: f64,
    pub branch_fits: BranchFits,
    pub contour_table: ContourTable,
    /// False when some scan sweeps a different potential range than the first.
    pub sweep_ranges_consistent: bool,
}

/// ECSA with the given capacitance constants and no excluded scans.
///
/// ```
/// use echem_fit::ecsa::calculate_ecsa;
/// use echem_fit::trace::{ScanFamily, Trace};
///
/// // rectangular CV loops: current = +/- 0.2 * rate on the two legs
/// let family = ScanFamily::from_traces([5.0, 20.0, 50.0].map(|rate| {
///     let e = vec![0.2, 0.1, 0.0, 0.1, 0.2];
///     let i = vec![-0.2 * rate, -0.2 * rate, 0.2 * rate, 0.2 * rate, 0.2 * rate];
///     (rate, Trace::new(e, i).unwrap())
/// }))
/// .unwrap();
///
/// let ecsa = calculate_ecsa(&family, 0.15, 1.0, 0.0).unwrap();
/// assert!((ecsa.value - 0.2).abs() < 1e-8);
/// ```
pub fn calculate_ecsa(
    family: &ScanFamily,
    contour_potential: f64,
    specific_capacitance: f64,
    blank_capacitance: f64,
) -> Result<EcsaResult> {
    let options = EcsaOptions::default()
        .with_specific_capacitance(specific_capacitance)
        .with_blank_capacitance(blank_capacitance);
    calculate_ecsa_with(family, contour_potential, &options)
}

pub fn calculate_ecsa_with(
    family: &ScanFamily,
    contour_potential: f64,
    options: &EcsaOptions,
) -> Result<EcsaResult> {
    if !(options.specific_capacitance.is_finite() && options.specific_capacitance > 0.0) {
        return Err(EchemError::InvalidParameter(format!(
            "specific capacitance must be positive, got {}",
            options.specific_capacitance
        )));
    }
    if !options.blank_capacitance.is_finite() {
        return Err(EchemError::InvalidParameter(
            "blank capacitance must be finite".to_string(),
        ));
    }

    let family = family.exclude_rates(&options.exclude_rates);
    if family.len() < 2 {
        return Err(EchemError::InsufficientData {
            needed: 2,
            got: family.len(),
        });
    }
    let sweep_ranges_consistent = family.check_sweep_ranges(options.sweep_tolerance);

    let table = fit_potential_contour(&family, contour_potential)?;
    let rates = table.scan_rates();
    let low = linear_fit(&rates, &table.currents_low(), None, None)?;
    let high = linear_fit(&rates, &table.currents_high(), None, None)?;
    log::debug!(
        "branch slopes at {} V: low {:.6e} (r2 {:.4}), high {:.6e} (r2 {:.4})",
        contour_potential,
        low.slope,
        low.r_squared,
        high.slope,
        high.r_squared
    );

    let c_low = Measurement::new(low.slope, low.slope_stderr).abs();
    let c_high = Measurement::new(high.slope, high.slope_stderr).abs();
    let c_dl = (c_low + c_high).scale(0.5);
    let ecsa = (c_dl - Measurement::exact(options.blank_capacitance))
        .scale(1.0 / options.specific_capacitance);

    Ok(EcsaResult {
        value: ecsa.value,
        value_stderr: ecsa.uncertainty,
        double_layer_capacitance: c_dl.value,
        branch_fits: BranchFits { low, high },
        contour_table: table,
        sweep_ranges_consistent,
    })
}

/// Capacitance of one CV loop from its enclosed area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoopCapacitance {
    pub scan_rate: f64,
    /// Enclosed area in A·V.
    pub area: f64,
    /// Capacitance in F.
    pub capacitance: f64,
    /// Capacitance per catalyst mass, F/g.
    pub per_mass: Option<f64>,
    /// Capacitance per electrode area, F/cm².
    pub per_area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecificCapacitance {
    pub loops: Vec<LoopCapacitance>,
    pub mean_per_mass: Option<f64>,
    pub mean_per_area: Option<f64>,
}

/// Specific capacitance from the area enclosed by each CV loop,
/// `C = 0.5 * area / (scan_rate * dV)` with current in A and rate in V/s.
///
/// `mass` is in g and `electrode_area` in cm²; either may be omitted.
pub fn specific_capacitance(
    family: &ScanFamily,
    mass: Option<f64>,
    electrode_area: Option<f64>,
) -> Result<SpecificCapacitance> {
    for (what, v) in [("mass", mass), ("electrode area", electrode_area)] {
        if let Some(v) = v {
            if !(v.is_finite() && v > 0.0) {
                return Err(EchemError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    what, v
                )));
            }
        }
    }

    let loops = family
        .iter()
        .map(|(scan_rate, trace)| {
            let (lo, hi) = trace.potential_range();
            let delta_v = hi - lo;
            if delta_v <= 0.0 {
                return Err(EchemError::InputShape(format!(
                    "scan at {} mV/s has no potential window",
                    scan_rate
                )));
            }
            let current_a: Vec<f64> = trace.current().iter().map(|i| i / 1000.0).collect();
            let area = polygon_area(trace.potential(), &current_a);
            let capacitance = 0.5 * area / (scan_rate / 1000.0 * delta_v);
            Ok(LoopCapacitance {
                scan_rate,
                area,
                capacitance,
                per_mass: mass.map(|m| capacitance / m),
                per_area: electrode_area.map(|a| capacitance / a),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mean_of = |f: fn(&LoopCapacitance) -> Option<f64>| {
        let values: Vec<f64> = loops.iter().filter_map(f).collect();
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };
    let mean_per_mass = mean_of(|l| l.per_mass);
    let mean_per_area = mean_of(|l| l.per_area);

    Ok(SpecificCapacitance {
        loops,
        mean_per_mass,
        mean_per_area,
    })
}

/// Absolute shoelace area of the closed polygon through `(x, y)`.
fn polygon_area(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    let twice: f64 = (0..n)
        .map(|k| {
            let j = (k + 1) % n;
            x[k] * y[j] - x[j] * y[k]
        })
        .sum();
    0.5 * twice.abs()
}
