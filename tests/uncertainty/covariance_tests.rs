use approx::assert_relative_eq;
use echem_fit::lm::LevenbergMarquardt;
use echem_fit::regression::linear_fit;
use echem_fit::uncertainty::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};
use echem_fit::{Problem, Result};
use ndarray::Array1;

struct Line<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

impl Problem for Line<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self
            .x
            .iter()
            .zip(self.y)
            .map(|(x, y)| params[0] * x + params[1] - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

fn scan_rate_data() -> (Vec<f64>, Vec<f64>) {
    let rates = vec![5.0, 10.0, 20.0, 50.0, 100.0, 200.0];
    let noise = [0.003, -0.004, 0.002, 0.005, -0.006, 0.001];
    let current = rates
        .iter()
        .zip(noise)
        .map(|(r, n)| 0.0021 * r + 0.01 + n)
        .collect();
    (rates, current)
}

#[test]
fn test_covariance_from_solver_jacobian_matches_line_fit() {
    let (x, y) = scan_rate_data();
    let problem = Line { x: &x, y: &y };
    let result = LevenbergMarquardt::new()
        .with_calc_jacobian(true)
        .minimize(&problem, Array1::from(vec![0.0, 0.0]))
        .unwrap();
    let jac = result.jacobian.unwrap();
    let redchi = result.cost / (x.len() - 2) as f64;
    let covar = calculate_covariance(&jac, redchi).unwrap();
    let stderr = standard_errors_from_covariance(&covar);

    let fit = linear_fit(&x, &y, None, None).unwrap();
    assert_relative_eq!(stderr[0], fit.slope_stderr, max_relative = 1e-4);
    assert_relative_eq!(stderr[1], fit.intercept_stderr, max_relative = 1e-4);
    assert_relative_eq!(covar[[0, 1]], fit.covariance[0][1], max_relative = 1e-4);
}

#[test]
fn test_slope_and_intercept_are_anticorrelated() {
    // all x positive, so a steeper slope pairs with a lower intercept
    let (x, y) = scan_rate_data();
    let fit = linear_fit(&x, &y, None, None).unwrap();
    let covar = ndarray::arr2(&fit.covariance);
    let correl = calculate_correlation(&covar);
    assert!(correl[[0, 1]] < 0.0);
    assert!(correl[[0, 1]] > -1.0);
    assert_eq!(correl[[0, 0]], 1.0);
}
