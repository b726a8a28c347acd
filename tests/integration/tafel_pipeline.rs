use approx::assert_relative_eq;
use echem_fit::tafel::models::{alpha_to_mv_per_decade, SeriesResistanceModel, TafelModel};
use echem_fit::tafel::{
    fit_tafel, fit_tafel_slope_lsq, prepare_tafel_data, BayesianTafelConfig, TafelDiagnostic,
    TafelMethod, TafelPreparation, TafelWindow,
};
use echem_fit::EchemError;

use crate::test_helpers::{linspace, with_noise};

/// Raw OER curve with a 60 mV/dec slope, as measured before iR and RHE
/// correction at the given pH and Ru (mOhm).
fn raw_oer_curve(ph: f64, ru: f64) -> (Vec<f64>, Vec<f64>) {
    let e_true = linspace(1.45, 1.70, 26);
    let current: Vec<f64> = e_true.iter().map(|e| 10f64.powf((e - 1.55) / 0.06)).collect();
    let raw = e_true
        .iter()
        .zip(&current)
        .map(|(e, i)| e - 0.210 - 0.059 * ph + i * ru / 1000.0)
        .collect();
    (raw, current)
}

#[test]
fn test_corrected_curve_gives_true_slope() {
    let (e, i) = raw_oer_curve(14.0, 0.5);
    let prep = TafelPreparation::default().with_ph(14.0).with_ru(0.5);
    let data = prepare_tafel_data(&e, &i, &prep).unwrap();

    let result = fit_tafel(&data, TafelMethod::LeastSquares, &BayesianTafelConfig::default()).unwrap();
    assert_relative_eq!(result.slope_mv_per_decade, 60.0, epsilon = 1e-4);
    assert_relative_eq!(result.r_squared.unwrap(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(data.potential[0], 1.45, epsilon = 1e-9);
}

#[test]
fn test_uncorrected_resistance_inflates_slope() {
    let (e, i) = raw_oer_curve(14.0, 0.5);
    let prep = TafelPreparation::default().with_ph(14.0);
    let data = prepare_tafel_data(&e, &i, &prep).unwrap();
    let fit = fit_tafel_slope_lsq(&data.potential, &data.log_current).unwrap();
    assert!(fit.slope_mv_per_decade > 60.0);
}

#[test]
fn test_window_selects_linear_region() {
    // the top of the curve bends over into a current plateau
    let e = linspace(0.0, 0.5, 51);
    let i: Vec<f64> = e
        .iter()
        .map(|v| {
            let kinetic = 10f64.powf(v / 0.12 - 2.0);
            kinetic / (1.0 + kinetic / 5.0)
        })
        .collect();
    let prep = TafelPreparation::default().with_window(TafelWindow {
        potential: None,
        log_current: Some((f64::NEG_INFINITY, -1.0)),
    });
    let data = prepare_tafel_data(&e, &i, &prep).unwrap();
    assert!(data.log_current.iter().all(|l| *l <= -1.0));

    let fit = fit_tafel_slope_lsq(&data.potential, &data.log_current).unwrap();
    assert_relative_eq!(fit.slope_mv_per_decade, 120.0, max_relative = 0.02);
}

#[test]
fn test_noisy_lsq_slope() {
    let e = linspace(0.2, 0.4, 40);
    let clean: Vec<f64> = e.iter().map(|v| v / 0.09 - 3.0).collect();
    let log_i = with_noise(&clean, 0.01, 8);
    let fit = fit_tafel_slope_lsq(&e, &log_i).unwrap();
    assert_relative_eq!(fit.slope_mv_per_decade, 90.0, max_relative = 0.03);
    assert!(fit.line.slope_stderr > 0.0);
}

#[test]
fn test_bayesian_pipeline_recovers_alpha() {
    let model = SeriesResistanceModel;
    let truth = [20.0, 2.0, 15.0];
    let e = linspace(0.0, 0.3, 30);
    let i: Vec<f64> = e.iter().map(|&v| 10f64.powf(model.evaluate(v, &truth))).collect();

    let data = prepare_tafel_data(&e, &i, &TafelPreparation::default()).unwrap();
    let config = BayesianTafelConfig::default()
        .with_sigma(0.02)
        .with_nsamples(800)
        .with_tune(800)
        .with_seed(11);
    let result = fit_tafel(&data, TafelMethod::Bayesian, &config).unwrap();

    let expected = alpha_to_mv_per_decade(20.0);
    assert!(
        (result.slope_mv_per_decade - expected).abs() / expected < 0.2,
        "slope {} vs {}",
        result.slope_mv_per_decade,
        expected
    );
    assert!(result.slope_std.is_some());
    assert!(result.r_squared.is_none());
    match &result.diagnostic {
        TafelDiagnostic::Bayesian(fit) => {
            assert_eq!(fit.parameter_names, vec!["alpha", "b", "ilim"]);
            assert_eq!(fit.posterior.chain_count(), 2);
            assert_relative_eq!(fit.potential_offset, 0.210, epsilon = 1e-12);
        }
        other => panic!("unexpected diagnostic {:?}", other),
    }
    // the dense curve spans the corrected potential range
    assert_relative_eq!(result.fit_potential[0], 0.210, epsilon = 1e-12);
    assert_relative_eq!(*result.fit_potential.last().unwrap(), 0.510, epsilon = 1e-12);
}

#[test]
fn test_bayesian_rejects_too_few_points() {
    let result = echem_fit::fit_tafel_slope_bayesian(&[0.0, 0.1], &[1.0, 2.0], 0.1, 100, 1);
    assert!(matches!(result, Err(EchemError::InsufficientData { .. })));
}

#[test]
fn test_generic_fitter_with_marcus_hush_chidsey() {
    use echem_fit::tafel::{BayesianFitter, MarcusHushChidseyModel};

    let model = MarcusHushChidseyModel::default();
    let e = linspace(0.0, 0.3, 25);
    let i: Vec<f64> = e.iter().map(|&v| 10f64.powf(model.evaluate(v, &[10.0]))).collect();
    let config = BayesianTafelConfig::default()
        .with_sigma(0.02)
        .with_nsamples(500)
        .with_tune(500)
        .with_seed(3);

    let fit = BayesianFitter::new(model, config).fit(&e, &i).unwrap();
    assert_eq!(fit.model, "marcus_hush_chidsey");
    // no linear Tafel region, so no slope
    assert!(fit.slope_mv_per_decade.is_none());
    assert!((fit.posterior_mean[0] - 10.0).abs() < 2.0, "lambda {}", fit.posterior_mean[0]);
}
