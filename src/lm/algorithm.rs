//! Implementation of the Levenberg-Marquardt algorithm.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{EchemError, Result};
use crate::problem::Problem;

use super::config::LmConfig;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution (if requested)
    pub jacobian: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Status of the iteration.
enum IterationStatus {
    /// Converged successfully
    Converged(String),

    /// Failed to converge
    Failed(String),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// A run that stops without meeting a convergence criterion is returned
    /// as `Ok` with `success == false`. Errors are reserved for invalid
    /// input and for residual functions that fail outright.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(EchemError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let cfg = &self.config;
        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        let mut cost = sum_squares(&residuals);
        if !cost.is_finite() {
            return Err(EchemError::Convergence(
                "cost is not finite at the initial parameters".to_string(),
            ));
        }

        let mut lambda = cfg.initial_lambda;
        let mut iterations = 0;

        let status = 'outer: loop {
            if n_params == 0 {
                break IterationStatus::Converged("No varying parameters".to_string());
            }
            if cost == 0.0 {
                break IterationStatus::Converged("Residuals vanish exactly".to_string());
            }

            let jac = problem.jacobian(&params)?;
            func_evals += n_params;
            let (jtj, g) = normal_equations(&jac, &residuals);

            let gradient_cosine = max_gradient_cosine(&jtj, &g, cost);
            if gradient_cosine <= cfg.gtol {
                break IterationStatus::Converged(format!(
                    "Gradient convergence: max cosine {:.2e} <= {:.2e}",
                    gradient_cosine, cfg.gtol
                ));
            }
            if iterations >= cfg.max_iterations {
                break IterationStatus::Failed(format!(
                    "Maximum iterations ({}) reached",
                    cfg.max_iterations
                ));
            }
            iterations += 1;

            loop {
                let step = match solve_damped(&jtj, &g, lambda) {
                    Some(step) => step,
                    None => {
                        lambda *= cfg.lambda_up_factor;
                        if lambda > cfg.max_lambda {
                            break 'outer IterationStatus::Failed(
                                "Failed to calculate step, and lambda reached maximum".to_string(),
                            );
                        }
                        continue;
                    }
                };

                // quadratic model reduction of sum(r^2)
                let predicted = -(2.0 * step.dot(&g) + step.dot(&(&jtj * &step)));

                let step_nd = Array1::from_iter(step.iter().copied());
                let new_params = &params + &step_nd;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost = sum_squares(&new_residuals);

                if new_cost.is_finite() && new_cost < cost {
                    let actual = cost - new_cost;
                    let x_norm = params.iter().map(|x| x * x).sum::<f64>().sqrt();
                    let step_norm = step.norm();

                    let cost_converged = actual <= cfg.ftol * cost && predicted <= cfg.ftol * cost;
                    let param_converged = step_norm <= cfg.xtol * (x_norm + cfg.xtol);

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    lambda = (lambda * cfg.lambda_down_factor).max(cfg.min_lambda);

                    if cost_converged {
                        break 'outer IterationStatus::Converged(format!(
                            "Cost convergence: |df|/|f| = {:.2e} <= {:.2e}",
                            actual / (cost + actual),
                            cfg.ftol
                        ));
                    }
                    if param_converged {
                        break 'outer IterationStatus::Converged(format!(
                            "Parameter convergence: |dx| = {:.2e}",
                            step_norm
                        ));
                    }
                    break;
                }

                let x_norm = params.iter().map(|x| x * x).sum::<f64>().sqrt();
                if step.norm() <= cfg.xtol * (x_norm + cfg.xtol) {
                    break 'outer IterationStatus::Converged(format!(
                        "Parameter convergence: |dx| = {:.2e}",
                        step.norm()
                    ));
                }
                if predicted.abs() <= cfg.ftol * cost {
                    break 'outer IterationStatus::Converged(format!(
                        "Cost convergence: predicted reduction {:.2e} below tolerance",
                        predicted
                    ));
                }
                lambda *= cfg.lambda_up_factor;
                if lambda > cfg.max_lambda {
                    break 'outer IterationStatus::Failed(
                        "Failed to decrease cost, and lambda reached maximum".to_string(),
                    );
                }
            }
        };

        let (success, message) = match status {
            IterationStatus::Converged(message) => (true, message),
            IterationStatus::Failed(message) => (false, message),
        };
        log::trace!(
            "LM finished after {} iterations (success = {}): {}",
            iterations,
            success,
            message
        );

        let jacobian = if cfg.calc_jacobian {
            Some(problem.jacobian(&params)?)
        } else {
            None
        };

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success,
            message,
            jacobian,
        })
    }
}

fn sum_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Largest cosine between the residual vector and a Jacobian column,
/// `|g_j| / (|J_j| |r|)`. Invariant to rescaling parameters or residuals.
fn max_gradient_cosine(jtj: &DMatrix<f64>, g: &DVector<f64>, cost: f64) -> f64 {
    let r_norm = cost.sqrt();
    g.iter()
        .enumerate()
        .map(|(j, gj)| {
            let col_norm = jtj[(j, j)].sqrt();
            if col_norm > 0.0 {
                gj.abs() / (col_norm * r_norm)
            } else {
                0.0
            }
        })
        .fold(0.0, f64::max)
}

/// Build `J^T J` and the gradient `J^T r`.
fn normal_equations(jac: &Array2<f64>, residuals: &Array1<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let jtj = jac.t().dot(jac);
    let g = jac.t().dot(residuals);
    let n = jtj.nrows();
    (
        DMatrix::from_fn(n, n, |i, j| jtj[[i, j]]),
        DVector::from_iterator(n, g.iter().copied()),
    )
}

/// Solve `(J^T J + lambda * D) step = -g` with Marquardt diagonal scaling.
fn solve_damped(jtj: &DMatrix<f64>, g: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let n = jtj.nrows();
    let max_diag = jtj.diagonal().amax();
    let floor = (1e-12 * max_diag).max(f64::MIN_POSITIVE);

    let mut a = jtj.clone();
    for i in 0..n {
        a[(i, i)] += lambda * jtj[(i, i)].max(floor);
    }
    let rhs = -g;

    let step = match a.clone().cholesky() {
        Some(chol) => chol.solve(&rhs),
        None => a.lu().solve(&rhs)?,
    };
    step.iter().all(|s| s.is_finite()).then_some(step)
}
