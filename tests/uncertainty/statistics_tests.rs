use approx::assert_relative_eq;
use echem_fit::uncertainty::statistics::{gelman_rubin, variance};
use echem_fit::uncertainty::SummaryStats;
use rand_distr::{Distribution, Normal};

#[test]
fn test_summary_of_normal_sample() {
    let mut rng = crate::test_helpers::rng(99);
    let normal = Normal::new(120.0, 5.0).unwrap();
    let samples: Vec<f64> = (0..50_000).map(|_| normal.sample(&mut rng)).collect();

    let stats = SummaryStats::from_samples(&samples);
    assert_relative_eq!(stats.mean, 120.0, epsilon = 0.1);
    assert_relative_eq!(stats.median, 120.0, epsilon = 0.15);
    assert_relative_eq!(stats.std, 5.0, epsilon = 0.1);
    // central 95% of a normal is mean +/- 1.96 sd
    assert_relative_eq!(stats.lower_95, 120.0 - 1.96 * 5.0, epsilon = 0.3);
    assert_relative_eq!(stats.upper_95, 120.0 + 1.96 * 5.0, epsilon = 0.3);
}

#[test]
fn test_independent_chains_mix() {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let chains: Vec<Vec<f64>> = (0..4)
        .map(|seed| {
            let mut rng = crate::test_helpers::rng(seed);
            (0..2000).map(|_| normal.sample(&mut rng)).collect()
        })
        .collect();
    let r_hat = gelman_rubin(&chains);
    assert!(r_hat < 1.01, "r_hat = {}", r_hat);
}

#[test]
fn test_degenerate_inputs() {
    assert!(variance(&[1.0], 1).is_nan());
    let constant = vec![vec![2.0; 10], vec![2.0; 10]];
    assert_eq!(gelman_rubin(&constant), 1.0);
}
