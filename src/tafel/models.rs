//! Physical models of log-current versus overpotential.
//!
//! Every model maps an overpotential offset `v` (V, starting at zero) and a
//! parameter vector to `log10` of the current. Parameters are assumed
//! non-negative, which the Bayesian fit relies on when it builds its
//! `[0, 10 p*]` prior box.

use std::f64::consts::{LN_10, LOG10_E};

use statrs::function::erf::erfc;

/// Thermal voltage `kT/e` at room temperature (V).
pub const THERMAL_VOLTAGE: f64 = 0.026;

/// A parameterized model of `log10(current)` as a function of overpotential.
pub trait TafelModel {
    fn name(&self) -> &str;

    /// Parameter names, in the order `evaluate` expects them.
    fn parameter_names(&self) -> &[&'static str];

    /// Default starting point for the nonlinear pre-fit.
    fn initial_guess(&self) -> Vec<f64>;

    /// `log10(current)` at overpotential offset `v`.
    fn evaluate(&self, v: f64, params: &[f64]) -> f64;

    /// Tafel slope in mV/decade implied by `params`, for models that have one.
    fn tafel_slope(&self, _params: &[f64]) -> Option<f64> {
        None
    }

    fn parameter_count(&self) -> usize {
        self.parameter_names().len()
    }

    fn evaluate_all(&self, v: &[f64], params: &[f64]) -> Vec<f64> {
        v.iter().map(|&vi| self.evaluate(vi, params)).collect()
    }
}

/// Convert an inverse Tafel slope `alpha` (1/V, natural-log units) to mV/decade.
pub fn alpha_to_mv_per_decade(alpha: f64) -> f64 {
    1000.0 / alpha * LN_10
}

/// Butler-Volmer kinetics limited by a series resistance / mass-transport
/// ceiling:
///
/// `log10 I = log10(e) * (b + alpha v - ln(ilim + exp(alpha v)))`
///
/// At low overpotential the slope is `alpha`; at high overpotential the
/// current saturates at `exp(b)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesResistanceModel;

impl TafelModel for SeriesResistanceModel {
    fn name(&self) -> &str {
        "series_resistance"
    }

    fn parameter_names(&self) -> &[&'static str] {
        &["alpha", "b", "ilim"]
    }

    fn initial_guess(&self) -> Vec<f64> {
        vec![15.0, 2.0, 15.0]
    }

    fn evaluate(&self, v: f64, params: &[f64]) -> f64 {
        let (alpha, b, ilim) = (params[0], params[1], params[2]);
        LOG10_E * (b + alpha * v - (ilim + (alpha * v).exp()).ln())
    }

    fn tafel_slope(&self, params: &[f64]) -> Option<f64> {
        Some(alpha_to_mv_per_decade(params[0]))
    }
}

/// Marcus-Hush-Chidsey kinetics with reorganization energy `lam` in units
/// of `kT`, normalized to zero overpotential.
#[derive(Debug, Clone, Copy)]
pub struct MarcusHushChidseyModel {
    pub thermal_voltage: f64,
}

impl Default for MarcusHushChidseyModel {
    fn default() -> Self {
        Self {
            thermal_voltage: THERMAL_VOLTAGE,
        }
    }
}

impl TafelModel for MarcusHushChidseyModel {
    fn name(&self) -> &str {
        "marcus_hush_chidsey"
    }

    fn parameter_names(&self) -> &[&'static str] {
        &["lam"]
    }

    fn initial_guess(&self) -> Vec<f64> {
        vec![10.0]
    }

    fn evaluate(&self, v: f64, params: &[f64]) -> f64 {
        let lam = params[0];
        let eta = v / self.thermal_voltage;
        let root = lam.sqrt();
        LOG10_E * (erfc((lam - eta) / (2.0 * root)).ln() - erfc(root / 2.0).ln())
    }
}

/// Volmer-Heyrovsky hydrogen evolution with frozen proton and water
/// activities.
///
/// Parameters: Volmer equilibrium constant `Kv` and its potential `Vv0`,
/// Heyrovsky rate constant `kh`, potential `Vh0` and transfer coefficient
/// `alpha_h`.
#[derive(Debug, Clone, Copy)]
pub struct HeyrovskyHerModel {
    pub a_proton: f64,
    pub a_water: f64,
    pub thermal_voltage: f64,
}

impl Default for HeyrovskyHerModel {
    fn default() -> Self {
        Self {
            a_proton: 1.0,
            a_water: 1.0,
            thermal_voltage: THERMAL_VOLTAGE,
        }
    }
}

impl HeyrovskyHerModel {
    pub fn with_activities(a_proton: f64, a_water: f64) -> Self {
        Self {
            a_proton,
            a_water,
            ..Self::default()
        }
    }
}

impl TafelModel for HeyrovskyHerModel {
    fn name(&self) -> &str {
        "heyrovsky_her"
    }

    fn parameter_names(&self) -> &[&'static str] {
        &["Kv", "Vv0", "kh", "Vh0", "alpha_h"]
    }

    fn initial_guess(&self) -> Vec<f64> {
        vec![1.0, 0.1, 1.0, 0.1, 0.5]
    }

    fn evaluate(&self, v: f64, params: &[f64]) -> f64 {
        let (kv, vv0, kh, vh0, alpha_h) = (params[0], params[1], params[2], params[3], params[4]);
        let f = 1.0 / self.thermal_voltage;
        let ln_rate = kh.ln() + kv.ln() + 2.0 * self.a_proton.ln()
            - alpha_h * f * (v - vh0)
            - (self.a_water * (f * (v - vv0)).exp() + kv * self.a_proton).ln();
        LOG10_E * ln_rate
    }

    /// Slope of the Heyrovsky step alone, `kT ln(10) / alpha_h`.
    fn tafel_slope(&self, params: &[f64]) -> Option<f64> {
        Some(alpha_to_mv_per_decade(params[4] / self.thermal_voltage))
    }
}
