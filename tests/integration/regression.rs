use approx::assert_relative_eq;
use echem_fit::regression::{linear_fit, linear_fit_with, LineParameter, LinearFitOptions};
use echem_fit::EchemError;

use crate::test_helpers::{linspace, with_noise};

#[test]
fn test_exact_line_has_zero_reduced_chi_square() {
    for (m, b) in [(0.002, 0.0), (-3.5, 12.0), (150.0, -0.4)] {
        let x = linspace(1.0, 200.0, 12);
        let y: Vec<f64> = x.iter().map(|x| m * x + b).collect();
        let fit = linear_fit(&x, &y, None, None).unwrap();
        assert_relative_eq!(fit.slope, m, max_relative = 1e-8);
        assert_relative_eq!(fit.intercept, b, epsilon = 1e-6 * (1.0 + b.abs()));
        assert!(fit.reduced_chi_square.abs() < 1e-12);
    }
}

#[test]
fn test_y_errors_give_chi_square_near_dof() {
    let x = linspace(0.0, 10.0, 200);
    let clean: Vec<f64> = x.iter().map(|x| 0.7 * x + 2.0).collect();
    let y = with_noise(&clean, 0.1, 3);
    let y_err = vec![0.1; x.len()];

    let fit = linear_fit(&x, &y, None, Some(&y_err)).unwrap();
    assert_relative_eq!(fit.slope, 0.7, epsilon = 5.0 * fit.slope_stderr);
    assert_relative_eq!(fit.intercept, 2.0, epsilon = 5.0 * fit.intercept_stderr);
    assert!((fit.reduced_chi_square - 1.0).abs() < 0.25);
}

#[test]
fn test_x_errors_use_swapped_axes() {
    let x = linspace(1.0, 5.0, 9);
    let y: Vec<f64> = x.iter().map(|x| 4.0 * x - 1.0).collect();
    let x_err = vec![0.05; x.len()];

    let fit = linear_fit(&x, &y, Some(&x_err), None).unwrap();
    assert_relative_eq!(fit.slope, 4.0, epsilon = 1e-6);
    assert_relative_eq!(fit.intercept, -1.0, epsilon = 1e-5);
}

#[test]
fn test_fixed_intercept() {
    let x = [5.0, 20.0, 50.0, 100.0];
    let y = [1.1, 4.0, 9.9, 20.1];
    let options = LinearFitOptions::default().fix_intercept(0.0);
    let fit = linear_fit_with(&x, &y, None, None, &options).unwrap();

    assert_eq!(fit.intercept, 0.0);
    assert_eq!(fit.intercept_stderr, 0.0);
    assert_eq!(fit.nvarys, 1);
    let sxy: f64 = x.iter().zip(&y).map(|(x, y)| x * y).sum();
    let sxx: f64 = x.iter().map(|x| x * x).sum();
    assert_relative_eq!(fit.slope, sxy / sxx, epsilon = 1e-7);
}

#[test]
fn test_bounded_slope() {
    let x = [0.0, 1.0, 2.0, 3.0];
    let y = [0.0, 2.0, 4.0, 6.0];
    let options = LinearFitOptions::default().with_slope(LineParameter::bounded(1.0, 0.0, 1.5));
    let fit = linear_fit_with(&x, &y, None, None, &options).unwrap();
    assert!(fit.slope <= 1.5);
    assert_relative_eq!(fit.slope, 1.5, epsilon = 1e-3);
}

#[test]
fn test_two_points_are_degenerate() {
    let fit = linear_fit(&[0.0, 1.0], &[1.0, 3.0], None, None).unwrap();
    assert!(fit.is_degenerate());
    assert!(fit.reduced_chi_square.is_nan());
    assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-8);
}

#[test]
fn test_shape_errors() {
    assert!(matches!(
        linear_fit(&[1.0], &[1.0], None, None),
        Err(EchemError::InsufficientData { .. })
    ));
    assert!(linear_fit(&[1.0, 2.0], &[1.0], None, None).is_err());
    assert!(matches!(
        linear_fit(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], None, Some(&[0.1, 0.0, 0.1])),
        Err(EchemError::InputShape(_))
    ));
}
