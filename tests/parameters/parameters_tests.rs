use approx::assert_relative_eq;
use echem_fit::lm::LevenbergMarquardt;
use echem_fit::parameters::{Parameter, ParameterError, Parameters};
use echem_fit::problem_params::{fit_parameter_problem, ParameterProblem};
use echem_fit::regression::linear_fit;
use echem_fit::Result;
use ndarray::Array1;

/// Tafel line `log|j| = (E - e0) / b` with named parameters.
struct TafelLine {
    params: Parameters,
    potential: Vec<f64>,
    log_current: Vec<f64>,
}

impl TafelLine {
    fn new(params: Parameters) -> Self {
        let potential: Vec<f64> = (0..15).map(|k| 0.2 + 0.01 * k as f64).collect();
        // b = 0.12 V/dec, e0 = 0.2 V
        let log_current = potential.iter().map(|e| (e - 0.2) / 0.12).collect();
        Self {
            params,
            potential,
            log_current,
        }
    }
}

impl ParameterProblem for TafelLine {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn eval_values(&self, values: &[f64]) -> Result<Array1<f64>> {
        let (b, e0) = (values[0], values[1]);
        Ok(self
            .potential
            .iter()
            .zip(&self.log_current)
            .map(|(e, y)| (e - e0) / b - y)
            .collect())
    }

    fn residual_count(&self) -> usize {
        self.potential.len()
    }
}

#[test]
fn test_lookup_and_errors() {
    let mut params = Parameters::new();
    params.add_param("b", 0.1).unwrap();
    params.add_param_with_bounds("e0", 0.0, -1.0, 1.0).unwrap();

    assert_eq!(params.len(), 2);
    assert!(params.contains("e0"));
    assert_eq!(params.value_of("b").unwrap(), 0.1);
    assert!(matches!(
        params.value_of("ilim"),
        Err(ParameterError::NotFound { .. })
    ));

    params.get_mut("b").unwrap().set_vary(false);
    assert_eq!(params.varying().len(), 1);
    assert_eq!(params.varying()[0].name(), "e0");
}

#[test]
fn test_fit_free_parameters() {
    let mut params = Parameters::new();
    params.add_param_with_bounds("b", 0.05, 0.001, 1.0).unwrap();
    params.add_param("e0", 0.0).unwrap();
    let problem = TafelLine::new(params);

    let fit = fit_parameter_problem(&problem, &LevenbergMarquardt::new().with_max_iterations(500)).unwrap();

    assert!(fit.lm.success, "{}", fit.lm.message);
    assert_relative_eq!(fit.parameters.value_of("b").unwrap(), 0.12, epsilon = 1e-6);
    assert_relative_eq!(fit.parameters.value_of("e0").unwrap(), 0.2, epsilon = 1e-6);
    assert!(fit.chi_square() < 1e-12);
    assert_eq!(fit.jacobian.shape(), &[15, 2]);
}

#[test]
fn test_fixed_parameter_is_held() {
    let mut params = Parameters::new();
    params.add_param("b", 0.05).unwrap();
    params.add(Parameter::fixed("e0", 0.2)).unwrap();
    let problem = TafelLine::new(params);

    let fit = fit_parameter_problem(&problem, &LevenbergMarquardt::new()).unwrap();

    assert_eq!(fit.parameters.value_of("e0").unwrap(), 0.2);
    assert_relative_eq!(fit.parameters.value_of("b").unwrap(), 0.12, epsilon = 1e-6);
    // only the varying parameter has a Jacobian column
    assert_eq!(fit.jacobian.ncols(), 1);
}

#[test]
fn test_bounded_parameter_stays_inside() {
    let mut params = Parameters::new();
    params.add_param_with_bounds("b", 0.05, 0.01, 0.08).unwrap();
    params.add_param("e0", 0.0).unwrap();
    let problem = TafelLine::new(params);

    let fit = fit_parameter_problem(&problem, &LevenbergMarquardt::new().with_max_iterations(500)).unwrap();

    let b = fit.parameters.value_of("b").unwrap();
    assert!((0.01..=0.08).contains(&b));
    // the best value inside the box is at the upper edge
    assert_relative_eq!(b, 0.08, epsilon = 1e-3);
}

/// Capacitive current against scan rate, `i = c v + i0`.
struct ChargingLine {
    params: Parameters,
    rate: Vec<f64>,
    current: Vec<f64>,
}

impl ParameterProblem for ChargingLine {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn eval_values(&self, values: &[f64]) -> Result<Array1<f64>> {
        Ok(self
            .rate
            .iter()
            .zip(&self.current)
            .map(|(v, i)| values[0] * v + values[1] - i)
            .collect())
    }

    fn residual_count(&self) -> usize {
        self.rate.len()
    }
}

#[test]
fn test_fit_sets_standard_errors() {
    let rate = vec![5.0, 10.0, 20.0, 50.0, 100.0, 200.0];
    let noise = [0.003, -0.004, 0.002, 0.005, -0.006, 0.001];
    let current: Vec<f64> = rate
        .iter()
        .zip(noise)
        .map(|(v, n)| 0.0021 * v + 0.01 + n)
        .collect();

    let mut params = Parameters::new();
    params.add_param("c", 0.0).unwrap();
    params.add_param("i0", 0.0).unwrap();
    let problem = ChargingLine {
        params,
        rate: rate.clone(),
        current: current.clone(),
    };
    let fit = fit_parameter_problem(&problem, &LevenbergMarquardt::new()).unwrap();
    let line = linear_fit(&rate, &current, None, None).unwrap();

    let c = fit.parameters.get("c").unwrap();
    let i0 = fit.parameters.get("i0").unwrap();
    assert_relative_eq!(c.stderr().unwrap(), line.slope_stderr, max_relative = 1e-4);
    assert_relative_eq!(i0.stderr().unwrap(), line.intercept_stderr, max_relative = 1e-4);

    // held parameters get no standard error
    let mut params = Parameters::new();
    params.add_param("c", 0.0).unwrap();
    params.add(Parameter::fixed("i0", 0.01)).unwrap();
    let problem = ChargingLine {
        params,
        rate,
        current,
    };
    let fit = fit_parameter_problem(&problem, &LevenbergMarquardt::new()).unwrap();
    assert!(fit.parameters.get("c").unwrap().stderr().unwrap() > 0.0);
    assert!(fit.parameters.get("i0").unwrap().stderr().is_none());
}
