use approx::assert_relative_eq;
use echem_fit::uncertainty::statistics::std_dev;
use echem_fit::uncertainty::Measurement;
use rand_distr::{Distribution, Normal};

#[test]
fn test_quotient_propagation_matches_sampling() {
    let a = Measurement::new(12.0, 0.12);
    let b = Measurement::new(3.0, 0.06);
    let propagated = a / b;

    let mut rng = crate::test_helpers::rng(7);
    let na = Normal::new(a.value, a.uncertainty).unwrap();
    let nb = Normal::new(b.value, b.uncertainty).unwrap();
    let samples: Vec<f64> = (0..20_000)
        .map(|_| na.sample(&mut rng) / nb.sample(&mut rng))
        .collect();

    assert_relative_eq!(propagated.value, 4.0);
    assert_relative_eq!(std_dev(&samples), propagated.uncertainty, max_relative = 0.05);
}

#[test]
fn test_chained_expression() {
    // (s - b) / (m * I) with exact constants reduces to a scaled difference
    let s = Measurement::new(0.05, 0.003);
    let b = Measurement::new(0.01, 0.004);
    let m = Measurement::exact(2.0);
    let i = Measurement::exact(0.1);
    let fe = ((s - b) / (m * i)).scale(100.0);

    assert_relative_eq!(fe.value, 20.0, epsilon = 1e-12);
    assert_relative_eq!(fe.uncertainty, 2.5, epsilon = 1e-12);
}

#[test]
fn test_display_and_conversion() {
    let m: Measurement = 1.5.into();
    assert_eq!(m.uncertainty, 0.0);
    assert_eq!(m.relative_uncertainty(), 0.0);
    assert_eq!(Measurement::new(2.0, 0.5).to_string(), "2 ± 0.5");
    assert_eq!((-Measurement::new(2.0, 0.5)).value, -2.0);
}
