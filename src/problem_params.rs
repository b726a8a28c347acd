//! Integration of the `Problem` trait with the `Parameters` system.
//!
//! A [`ParameterProblem`] is written against named parameters: it evaluates
//! residuals for a full, ordered vector of parameter values (fixed ones
//! included). [`ParameterProblemAdapter`] turns it into a plain [`Problem`]
//! over the varying parameters only, either in the solver's unbounded
//! internal coordinates or in external (physical) coordinates.

use crate::error::{EchemError, Result};
use crate::lm::{LevenbergMarquardt, LmResult};
use crate::parameters::Parameters;
use crate::problem::Problem;
use crate::uncertainty::{calculate_covariance, standard_errors_from_covariance};
use crate::utils::finite_difference;
use ndarray::{Array1, Array2};

/// A trait for problems that use the Parameters system
pub trait ParameterProblem {
    /// The parameters with their starting values, bounds and vary flags.
    fn parameters(&self) -> &Parameters;

    /// Evaluate residuals for `values`, one entry per parameter in
    /// `parameters()` order.
    fn eval_values(&self, values: &[f64]) -> Result<Array1<f64>>;

    /// Get the number of residuals in the problem
    fn residual_count(&self) -> usize;
}

/// Coordinate system the adapter exposes to the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinates {
    /// Unbounded solver coordinates; bounds are enforced by the transform.
    Internal,
    /// Physical parameter values; used for covariance estimation.
    External,
}

/// An adapter that implements `Problem` for `ParameterProblem` implementations
pub struct ParameterProblemAdapter<'a, P: ParameterProblem + ?Sized> {
    problem: &'a P,
    coordinates: Coordinates,
}

impl<'a, P: ParameterProblem + ?Sized> ParameterProblemAdapter<'a, P> {
    pub fn new(problem: &'a P) -> Self {
        Self {
            problem,
            coordinates: Coordinates::Internal,
        }
    }

    pub fn external(problem: &'a P) -> Self {
        Self {
            problem,
            coordinates: Coordinates::External,
        }
    }

    /// Expand a vector of varying values into the full ordered value vector.
    pub fn full_values(&self, varying: &Array1<f64>) -> Result<Vec<f64>> {
        let params = self.problem.parameters();
        let expected = params.varying_count();
        if varying.len() != expected {
            return Err(EchemError::DimensionMismatch(format!(
                "Expected {} varying parameters, got {}",
                expected,
                varying.len()
            )));
        }

        let mut next = varying.iter();
        let mut values = Vec::with_capacity(params.len());
        for param in params.iter() {
            let value = if param.vary() {
                let v = *next.next().ok_or_else(|| {
                    EchemError::DimensionMismatch("varying parameter vector too short".to_string())
                })?;
                match self.coordinates {
                    Coordinates::Internal => param.from_internal(v),
                    Coordinates::External => v,
                }
            } else {
                param.value()
            };
            values.push(value);
        }
        Ok(values)
    }
}

impl<'a, P: ParameterProblem + ?Sized> Problem for ParameterProblemAdapter<'a, P> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let values = self.full_values(params)?;
        self.problem.eval_values(&values)
    }

    fn parameter_count(&self) -> usize {
        self.problem.parameters().varying_count()
    }

    fn residual_count(&self) -> usize {
        self.problem.residual_count()
    }
}

/// Outcome of fitting a [`ParameterProblem`].
#[derive(Debug, Clone)]
pub struct ParameterFit {
    /// Parameters with their fitted values (fixed ones unchanged).
    pub parameters: Parameters,
    /// Raw optimizer result in internal coordinates.
    pub lm: LmResult,
    /// Residuals at the solution.
    pub residuals: Array1<f64>,
    /// Jacobian of the residuals with respect to the varying parameters in
    /// external coordinates, evaluated at the solution.
    pub jacobian: Array2<f64>,
}

impl ParameterFit {
    /// Sum of squared residuals at the solution.
    pub fn chi_square(&self) -> f64 {
        self.residuals.iter().map(|r| r * r).sum()
    }
}

/// Fit a parameter problem starting from its current parameter values.
///
/// The returned result carries `lm.success`; callers decide whether a
/// non-converged run is an error. Varying parameters get a standard error
/// from `redchi * inv(J^T J)` when degrees of freedom remain and the
/// Jacobian has full rank.
pub fn fit_parameter_problem<P: ParameterProblem + ?Sized>(
    problem: &P,
    optimizer: &LevenbergMarquardt,
) -> Result<ParameterFit> {
    let start = Array1::from_vec(problem.parameters().varying_internal_values()?);
    let adapter = ParameterProblemAdapter::new(problem);
    let lm = optimizer.minimize(&adapter, start)?;

    let mut parameters = problem.parameters().clone();
    parameters.update_from_internal(&lm.params.to_vec())?;

    let external = ParameterProblemAdapter::external(problem);
    let varying = Array1::from_vec(parameters.varying_values());
    let residuals = external.eval(&varying)?;
    let jacobian = finite_difference::jacobian(&external, &varying, None)?;

    let nfree = residuals.len() as isize - varying.len() as isize;
    if nfree > 0 && !varying.is_empty() {
        let redchi = residuals.iter().map(|r| r * r).sum::<f64>() / nfree as f64;
        if let Ok(covar) = calculate_covariance(&jacobian, redchi) {
            let stderr = standard_errors_from_covariance(&covar).to_vec();
            parameters.set_varying_stderr(&stderr)?;
        }
    }

    Ok(ParameterFit {
        parameters,
        lm,
        residuals,
        jacobian,
    })
}
