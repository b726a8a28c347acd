//! Weighted chi-squared fit of a straight line `y = m x + b`.
//!
//! The objective is `sum((y_i - m x_i - b)^2 / sigma_i^2)` where the
//! per-point variance depends on which axes carry an error:
//!
//! | errors given | `sigma_i^2`                   |
//! |--------------|-------------------------------|
//! | none         | `1`                           |
//! | `y_err`      | `y_err_i^2`                   |
//! | `x_err`      | `m^2 x_err_i^2`               |
//! | both         | `m^2 x_err_i^2 + y_err_i^2`   |
//!
//! With only `x_err`, the line is fitted with the axes swapped (errors on the
//! new dependent variable) and the result is inverted back, `m = 1/m'`,
//! `b = -b'/m'`, with the covariance carried through the Jacobian of that
//! inversion. Either parameter may be held fixed or bounded.

use serde::Serialize;
use std::f64::{INFINITY, NEG_INFINITY};

use crate::error::{ensure_min_len, ensure_same_len, EchemError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::parameters::{Parameter, Parameters};
use crate::problem_params::{fit_parameter_problem, ParameterProblem};
use crate::uncertainty::{standard_errors_from_covariance, statistics, unscaled_covariance};
use ndarray::{Array1, Array2};

/// Starting value, vary flag and bounds of one line parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParameter {
    pub initial: f64,
    pub vary: bool,
    pub min: f64,
    pub max: f64,
}

impl LineParameter {
    pub fn free(initial: f64) -> Self {
        Self {
            initial,
            vary: true,
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }

    /// Hold the parameter at `value` during the fit.
    pub fn fixed(value: f64) -> Self {
        Self {
            vary: false,
            ..Self::free(value)
        }
    }

    pub fn bounded(initial: f64, min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            ..Self::free(initial)
        }
    }

    fn is_bounded(&self) -> bool {
        self.min.is_finite() || self.max.is_finite()
    }

    fn to_parameter(self, name: &str) -> Result<Parameter> {
        if self.vary {
            let mut p = Parameter::with_bounds(name, self.initial, self.min, self.max)?;
            // keep the start off the bound, where the transform has zero slope
            let width = self.max - self.min;
            if width.is_finite() {
                if width > 0.0 {
                    let inset = 1e-6 * width;
                    p.set_value(p.value().clamp(self.min + inset, self.max - inset))?;
                }
            } else if self.min.is_finite() && p.value() <= self.min {
                p.set_value(self.min + one_sided_inset(self.min))?;
            } else if self.max.is_finite() && p.value() >= self.max {
                p.set_value(self.max - one_sided_inset(self.max))?;
            }
            Ok(p)
        } else {
            Ok(Parameter::fixed(name, self.initial))
        }
    }
}

fn one_sided_inset(bound: f64) -> f64 {
    (1e-6 * bound.abs()).max(1e-6)
}

/// Options for [`linear_fit_with`].
#[derive(Debug, Clone)]
pub struct LinearFitOptions {
    pub slope: LineParameter,
    pub intercept: LineParameter,
    pub solver: LmConfig,
}

impl Default for LinearFitOptions {
    fn default() -> Self {
        Self {
            slope: LineParameter::free(1.0),
            intercept: LineParameter::free(0.0),
            solver: LmConfig {
                max_iterations: 1000,
                ..LmConfig::default()
            },
        }
    }
}

impl LinearFitOptions {
    pub fn with_slope(mut self, slope: LineParameter) -> Self {
        self.slope = slope;
        self
    }

    pub fn with_intercept(mut self, intercept: LineParameter) -> Self {
        self.intercept = intercept;
        self
    }

    /// Shorthand for a line forced through `(0, value)`.
    pub fn fix_intercept(self, value: f64) -> Self {
        self.with_intercept(LineParameter::fixed(value))
    }

    pub fn with_solver(mut self, solver: LmConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Equivalent options for the axis-swapped fit, when one exists.
    fn swapped(&self) -> Option<Self> {
        if self.slope.is_bounded() || self.intercept.is_bounded() {
            return None;
        }
        if self.slope.initial == 0.0 {
            return None;
        }
        if !self.intercept.vary && self.slope.vary && self.intercept.initial != 0.0 {
            return None;
        }

        let m = self.slope.initial;
        let slope = LineParameter {
            initial: 1.0 / m,
            ..self.slope
        };
        let intercept = LineParameter {
            initial: -self.intercept.initial / m,
            ..self.intercept
        };
        Some(Self {
            slope,
            intercept,
            solver: self.solver.clone(),
        })
    }
}

/// Non-fatal conditions attached to a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitWarning {
    /// No degrees of freedom are left; reduced chi-square is undefined.
    Degenerate { ndata: usize, nvarys: usize },
}

/// Result of a straight-line fit.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub slope: f64,
    pub slope_stderr: f64,
    pub intercept: f64,
    pub intercept_stderr: f64,
    /// Chi-square per degree of freedom; NaN when the fit is degenerate.
    pub reduced_chi_square: f64,
    pub chi_square: f64,
    /// `1 - SS_res / SS_tot` on the dependent variable.
    pub r_squared: f64,
    /// Covariance of `(slope, intercept)`; rows of fixed parameters are zero.
    pub covariance: [[f64; 2]; 2],
    pub ndata: usize,
    pub nvarys: usize,
    pub warnings: Vec<FitWarning>,
}

impl FitResult {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn is_degenerate(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, FitWarning::Degenerate { .. }))
    }

    /// Degrees of freedom, `ndata - nvarys`.
    pub fn nfree(&self) -> isize {
        self.ndata as isize - self.nvarys as isize
    }
}

/// Fit `y = m x + b` with default options.
///
/// ```
/// use echem_fit::regression::linear_fit;
///
/// let x = [0.0, 1.0, 2.0, 3.0];
/// let y = [1.0, 3.0, 5.0, 7.0];
/// let fit = linear_fit(&x, &y, None, None).unwrap();
/// assert!((fit.slope - 2.0).abs() < 1e-8);
/// assert!((fit.intercept - 1.0).abs() < 1e-8);
/// ```
pub fn linear_fit(
    x: &[f64],
    y: &[f64],
    x_err: Option<&[f64]>,
    y_err: Option<&[f64]>,
) -> Result<FitResult> {
    linear_fit_with(x, y, x_err, y_err, &LinearFitOptions::default())
}

/// Fit `y = m x + b` with explicit parameter options.
pub fn linear_fit_with(
    x: &[f64],
    y: &[f64],
    x_err: Option<&[f64]>,
    y_err: Option<&[f64]>,
    options: &LinearFitOptions,
) -> Result<FitResult> {
    ensure_same_len("x and y", x.len(), y.len())?;
    ensure_min_len(2, x.len())?;
    check_finite("x", x)?;
    check_finite("y", y)?;
    if let Some(xe) = x_err {
        check_errors("x_err", xe, x.len())?;
    }
    if let Some(ye) = y_err {
        check_errors("y_err", ye, y.len())?;
    }

    match (x_err, y_err) {
        (None, None) => fit_line(x, y, Sigma::Unit, options),
        (None, Some(ye)) => {
            require_positive("y_err", ye)?;
            fit_line(x, y, Sigma::Y(ye), options)
        }
        (Some(xe), None) => {
            require_positive("x_err", xe)?;
            match options.swapped() {
                Some(swapped) => {
                    let fit = fit_line(y, x, Sigma::Y(xe), &swapped)?;
                    invert_swapped(fit, x, y)
                }
                None => fit_line(x, y, Sigma::X(xe), options),
            }
        }
        (Some(xe), Some(ye)) => {
            if let Some(i) = xe.iter().zip(ye).position(|(a, b)| *a == 0.0 && *b == 0.0) {
                return Err(EchemError::InputShape(format!(
                    "x_err and y_err are both zero at index {}",
                    i
                )));
            }
            fit_line(x, y, Sigma::Both(xe, ye), options)
        }
    }
}

fn check_finite(what: &str, values: &[f64]) -> Result<()> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(EchemError::InputShape(format!(
            "{} contains a non-finite value at index {}",
            what, i
        )));
    }
    Ok(())
}

fn check_errors(what: &str, err: &[f64], n: usize) -> Result<()> {
    ensure_same_len(what, err.len(), n)?;
    check_finite(what, err)?;
    if let Some(i) = err.iter().position(|e| *e < 0.0) {
        return Err(EchemError::InputShape(format!(
            "{} must be non-negative, got {} at index {}",
            what, err[i], i
        )));
    }
    Ok(())
}

fn require_positive(what: &str, err: &[f64]) -> Result<()> {
    if let Some(i) = err.iter().position(|e| *e == 0.0) {
        return Err(EchemError::InputShape(format!(
            "{} is zero at index {}; the point would have infinite weight",
            what, i
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Sigma<'a> {
    Unit,
    Y(&'a [f64]),
    X(&'a [f64]),
    Both(&'a [f64], &'a [f64]),
}

impl Sigma<'_> {
    fn at(&self, i: usize, m: f64) -> f64 {
        match self {
            Sigma::Unit => 1.0,
            Sigma::Y(ye) => ye[i],
            Sigma::X(xe) => (m * xe[i]).abs(),
            Sigma::Both(xe, ye) => (m * m * xe[i] * xe[i] + ye[i] * ye[i]).sqrt(),
        }
    }

    fn is_weighted(&self) -> bool {
        !matches!(self, Sigma::Unit)
    }
}

struct LineProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    sigma: Sigma<'a>,
    params: Parameters,
}

impl ParameterProblem for LineProblem<'_> {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn eval_values(&self, values: &[f64]) -> Result<Array1<f64>> {
        let (m, b) = (values[0], values[1]);
        Ok(self
            .x
            .iter()
            .zip(self.y)
            .enumerate()
            .map(|(i, (&x, &y))| {
                let s = self.sigma.at(i, m);
                if s > 0.0 {
                    (y - m * x - b) / s
                } else {
                    INFINITY
                }
            })
            .collect())
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

fn fit_line(x: &[f64], y: &[f64], sigma: Sigma<'_>, options: &LinearFitOptions) -> Result<FitResult> {
    let mut params = Parameters::new();
    params.add(options.slope.to_parameter("m")?)?;
    params.add(options.intercept.to_parameter("b")?)?;

    let problem = LineProblem {
        x,
        y,
        sigma,
        params,
    };
    let ndata = x.len();
    let nvarys = problem.params.varying_count();

    let (slope, intercept, chi_square, jacobian) = if nvarys == 0 {
        let m = options.slope.initial;
        let b = options.intercept.initial;
        let residuals = problem.eval_values(&[m, b])?;
        (m, b, residuals.iter().map(|r| r * r).sum(), None)
    } else {
        let fit = fit_parameter_problem(&problem, &LevenbergMarquardt::with_config(options.solver.clone()))?;
        if !fit.lm.success {
            return Err(EchemError::Convergence(format!(
                "linear fit did not converge: {}",
                fit.lm.message
            )));
        }
        (
            fit.parameters.value_of("m")?,
            fit.parameters.value_of("b")?,
            fit.chi_square(),
            Some(fit.jacobian),
        )
    };

    let nfree = ndata as isize - nvarys as isize;
    let mut warnings = Vec::new();
    let reduced_chi_square = if nfree > 0 {
        chi_square / nfree as f64
    } else {
        log::warn!(
            "degenerate line fit: {} points for {} free parameters, reduced chi-square is undefined",
            ndata,
            nvarys
        );
        warnings.push(FitWarning::Degenerate { ndata, nvarys });
        f64::NAN
    };

    let mut covariance = [[0.0; 2]; 2];
    if let Some(jac) = jacobian {
        let unscaled = unscaled_covariance(&jac)?;
        let scale = if nfree > 0 {
            reduced_chi_square
        } else if sigma.is_weighted() {
            1.0
        } else {
            0.0
        };
        let varying: Vec<usize> = [options.slope.vary, options.intercept.vary]
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| i)
            .collect();
        for (a, &i) in varying.iter().enumerate() {
            for (c, &j) in varying.iter().enumerate() {
                covariance[i][j] = unscaled[[a, c]] * scale;
            }
        }
    }

    let stderr = standard_errors_from_covariance(&Array2::from_shape_fn((2, 2), |(i, j)| {
        covariance[i][j]
    }));
    let predicted: Vec<f64> = x.iter().map(|&xi| slope * xi + intercept).collect();

    Ok(FitResult {
        slope,
        slope_stderr: stderr[0],
        intercept,
        intercept_stderr: stderr[1],
        reduced_chi_square,
        chi_square,
        r_squared: statistics::r_squared(y, &predicted),
        covariance,
        ndata,
        nvarys,
        warnings,
    })
}

/// Map a fit of `x = m' y + b'` back to `y = m x + b`.
fn invert_swapped(fit: FitResult, x: &[f64], y: &[f64]) -> Result<FitResult> {
    let ms = fit.slope;
    let bs = fit.intercept;
    if ms == 0.0 {
        return Err(EchemError::InvalidParameter(
            "swapped-axis fit returned a zero slope; the line cannot be inverted".to_string(),
        ));
    }

    let slope = 1.0 / ms;
    let intercept = -bs / ms;

    // d(m, b) / d(m', b')
    let t = [[-1.0 / (ms * ms), 0.0], [bs / (ms * ms), -1.0 / ms]];
    let c = fit.covariance;
    let mut covariance = [[0.0; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            let mut acc = 0.0;
            for k in 0..2 {
                for l in 0..2 {
                    acc += t[i][k] * c[k][l] * t[j][l];
                }
            }
            covariance[i][j] = acc;
        }
    }

    let predicted: Vec<f64> = x.iter().map(|&xi| slope * xi + intercept).collect();
    Ok(FitResult {
        slope,
        slope_stderr: covariance[0][0].max(0.0).sqrt(),
        intercept,
        intercept_stderr: covariance[1][1].max(0.0).sqrt(),
        r_squared: statistics::r_squared(y, &predicted),
        covariance,
        ..fit
    })
}
