use approx::assert_relative_eq;
use echem_fit::faradaic::{
    faradaic_efficiency, fit_calibration, median_current, signal_for_efficiency, Calibration,
};
use echem_fit::uncertainty::Measurement;

use crate::test_helpers::{linspace, with_noise};

#[test]
fn test_round_trip_with_fitted_calibration() {
    // GC peak area against the current that produced it
    let current = linspace(1.0, 20.0, 8);
    let clean: Vec<f64> = current.iter().map(|i| 3.2 * i + 0.7).collect();
    let signal = with_noise(&clean, 0.05, 21);
    let (cal, fit) = fit_calibration(&current, &signal, None).unwrap();
    assert_relative_eq!(cal.slope, 3.2, max_relative = 0.01);

    let avg = 12.5;
    let s = signal_for_efficiency(85.0, avg, cal.slope, cal.intercept);
    let fe = cal.efficiency(Measurement::exact(s), Measurement::exact(avg)).unwrap();
    assert_relative_eq!(fe.value, 85.0, epsilon = 1e-9);
    // only the calibration contributes uncertainty here
    assert!(fe.uncertainty > 0.0);
    assert!(fit.reduced_chi_square > 0.0);
}

#[test]
fn test_covariance_matters() {
    // slope and intercept of a line fitted over positive currents are
    // anticorrelated, which shrinks the propagated error near the data
    let current = linspace(5.0, 15.0, 6);
    let signal = with_noise(&current.iter().map(|i| 2.0 * i).collect::<Vec<_>>(), 0.1, 4);
    let (cal, _) = fit_calibration(&current, &signal, None).unwrap();
    assert!(cal.covariance[0][1] < 0.0);

    let s = Measurement::exact(cal.slope * 10.0 + cal.intercept);
    let i = Measurement::exact(10.0);
    let with_cov = cal.efficiency(s, i).unwrap();
    let independent =
        faradaic_efficiency(s, i, cal.slope_measurement(), cal.intercept_measurement()).unwrap();

    assert_relative_eq!(with_cov.value, independent.value, epsilon = 1e-9);
    assert!(with_cov.uncertainty < independent.uncertainty);
}

#[test]
fn test_calibration_with_current_errors() {
    let current = [2.0, 4.0, 6.0, 8.0, 10.0];
    let signal: Vec<f64> = current.iter().map(|i| 1.5 * i + 0.2).collect();
    let errors = [0.05; 5];
    let (cal, _) = fit_calibration(&current, &signal, Some(&errors)).unwrap();
    assert_relative_eq!(cal.slope, 1.5, epsilon = 1e-6);
    assert_relative_eq!(cal.intercept, 0.2, epsilon = 1e-5);
    assert_relative_eq!(cal.current_for_signal(15.2).unwrap(), 10.0, epsilon = 1e-5);
}

#[test]
fn test_exact_calibration() {
    let cal = Calibration::exact(5.0, 0.0);
    let fe = cal
        .efficiency(Measurement::new(45.0, 0.45), Measurement::new(10.0, 0.1))
        .unwrap();
    assert_relative_eq!(fe.value, 90.0, epsilon = 1e-12);
    // 1% on each input
    assert_relative_eq!(fe.uncertainty, 90.0 * 2f64.sqrt() / 100.0, epsilon = 1e-9);
    assert!(cal.efficiency(Measurement::exact(1.0), Measurement::exact(0.0)).is_err());
}

#[test]
fn test_injection_medians_feed_product_analysis() {
    // a 30 min electrolysis sampled every second, GC injections every 10 min
    let time = linspace(0.0, 1799.0, 1800);
    let clean: Vec<f64> = time.iter().map(|t| if *t < 600.0 { 20.0 } else { 25.0 }).collect();
    let current = with_noise(&clean, 0.3, 5);
    let medians = median_current(&time, &current, &[600.0, 1200.0, 1800.0]).unwrap();
    assert_eq!(medians.len(), 3);
    assert_relative_eq!(medians[0], 20.0, epsilon = 0.1);
    assert_relative_eq!(medians[2], 25.0, epsilon = 0.1);

    let cal = Calibration::exact(2.0, 0.0);
    for (k, &avg) in medians.iter().enumerate() {
        // the product takes 60 % of the charge in every interval
        let signal = signal_for_efficiency(60.0, avg, cal.slope, cal.intercept);
        let product = cal
            .analyze_product(Measurement::exact(signal), Measurement::exact(avg), 0.5)
            .unwrap();
        assert_relative_eq!(product.efficiency.value, 60.0, epsilon = 1e-9);
        assert_relative_eq!(product.partial_current.value, 0.6 * avg, epsilon = 1e-9);
        assert_relative_eq!(product.partial_current_density.value, 1.2 * avg, epsilon = 1e-9);
        assert_eq!(product.partial_current.uncertainty, 0.0, "interval {}", k);
    }
}
