use approx::assert_relative_eq;
use echem_fit::contour::fit_potential_contour;
use echem_fit::ecsa::{calculate_ecsa, calculate_ecsa_with, EcsaOptions};
use echem_fit::trace::{ScanFamily, Trace};
use echem_fit::EchemError;

use crate::test_helpers::{capacitive_cv, with_noise};

const RATES: [f64; 5] = [5.0, 20.0, 50.0, 100.0, 200.0];

fn family(c: f64) -> ScanFamily {
    ScanFamily::from_traces(RATES.map(|r| (r, capacitive_cv(r, c, 0.1, -0.1, 0.3, 41)))).unwrap()
}

#[test]
fn test_capacitance_recovered_from_family() {
    let ecsa = calculate_ecsa(&family(0.2), 0.1, 1.0, 0.0).unwrap();

    assert_relative_eq!(ecsa.value, 0.2, epsilon = 1e-6);
    assert_relative_eq!(ecsa.branch_fits.low.slope, -0.2, epsilon = 1e-6);
    assert_relative_eq!(ecsa.branch_fits.high.slope, 0.2, epsilon = 1e-6);
    // the resistive background sits in the intercepts
    assert_relative_eq!(ecsa.branch_fits.high.intercept, 0.01, epsilon = 1e-6);
    assert_eq!(ecsa.contour_table.len(), RATES.len());
    assert!(ecsa.sweep_ranges_consistent);
}

#[test]
fn test_mismatched_sweep_range_is_flagged() {
    let mut family = family(0.2);
    // a wider window still crosses the contour potential
    family.insert(300.0, capacitive_cv(300.0, 0.2, 0.1, -0.3, 0.3, 61)).unwrap();

    let ecsa = calculate_ecsa(&family, 0.1, 1.0, 0.0).unwrap();
    assert!(!ecsa.sweep_ranges_consistent);
    assert_relative_eq!(ecsa.value, 0.2, epsilon = 1e-6);

    let json = serde_json::to_value(&ecsa).unwrap();
    assert_eq!(json["sweep_ranges_consistent"], false);
}

#[test]
fn test_blank_and_specific_capacitance() {
    let ecsa = calculate_ecsa(&family(0.002), 0.1, 0.04, 0.0005).unwrap();
    assert_relative_eq!(ecsa.double_layer_capacitance, 0.002, epsilon = 1e-9);
    assert_relative_eq!(ecsa.value, (0.002 - 0.0005) / 0.04, epsilon = 1e-6);
}

#[test]
fn test_noisy_family_reports_uncertainty() {
    let traces = RATES.map(|r| {
        let clean = capacitive_cv(r, 0.05, 0.0, -0.1, 0.3, 41);
        let noisy = with_noise(clean.current(), 0.02, r as u64);
        (r, Trace::new(clean.potential().to_vec(), noisy).unwrap())
    });
    let family = ScanFamily::from_traces(traces).unwrap();
    let ecsa = calculate_ecsa(&family, 0.1, 1.0, 0.0).unwrap();

    assert!(ecsa.value_stderr > 0.0);
    assert_relative_eq!(ecsa.value, 0.05, epsilon = 5.0 * ecsa.value_stderr + 1e-3);
}

#[test]
fn test_excluded_rate_is_left_out() {
    let mut family = family(0.2);
    // an outlier scan with a different capacitance
    family.insert(500.0, capacitive_cv(500.0, 1.0, 0.1, -0.1, 0.3, 41)).unwrap();

    let options = EcsaOptions::default().with_excluded_rates(vec![500.0]);
    let ecsa = calculate_ecsa_with(&family, 0.1, &options).unwrap();
    assert_relative_eq!(ecsa.value, 0.2, epsilon = 1e-6);
    assert_eq!(ecsa.contour_table.len(), RATES.len());
}

#[test]
fn test_single_trace_family() {
    let family = ScanFamily::from_traces([(10.0, capacitive_cv(10.0, 0.2, 0.0, -0.1, 0.3, 11))]).unwrap();

    let table = fit_potential_contour(&family, 0.1).unwrap();
    assert_eq!(table.len(), 1);
    assert_relative_eq!(table.rows[0].current_low, -2.0, epsilon = 1e-12);
    assert_relative_eq!(table.rows[0].current_high, 2.0, epsilon = 1e-12);

    assert!(matches!(
        calculate_ecsa(&family, 0.1, 1.0, 0.0),
        Err(EchemError::InsufficientData { needed: 2, got: 1 })
    ));
}

#[test]
fn test_invalid_specific_capacitance() {
    assert!(matches!(
        calculate_ecsa(&family(0.2), 0.1, 0.0, 0.0),
        Err(EchemError::InvalidParameter(_))
    ));
}
