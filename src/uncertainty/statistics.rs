//! Summary statistics for samples and fit diagnostics.

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with `ddof` delta degrees of freedom.
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - ddof) as f64
}

/// Sample standard deviation (`ddof = 1`).
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values, 1).sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Linear-interpolated quantile of already sorted values, `q` in [0, 1].
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn median(values: &[f64]) -> f64 {
    quantile_sorted(&sorted(values), 0.5)
}

/// Central interval holding `probability` of the samples, e.g. 0.95.
pub fn central_interval(values: &[f64], probability: f64) -> (f64, f64) {
    let s = sorted(values);
    let tail = (1.0 - probability) / 2.0;
    (quantile_sorted(&s, tail), quantile_sorted(&s, 1.0 - tail))
}

/// Coefficient of determination `1 - SS_res / SS_tot` on `observed`.
///
/// NaN when the observations have no spread.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let m = mean(observed);
    let ss_tot: f64 = observed.iter().map(|y| (y - m).powi(2)).sum();
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return f64::NAN;
    }
    1.0 - ss_res / ss_tot
}

/// Gelman-Rubin potential scale reduction factor over equal-length chains.
///
/// NaN with fewer than two chains or fewer than two draws per chain.
pub fn gelman_rubin(chains: &[Vec<f64>]) -> f64 {
    let m = chains.len();
    let n = chains.iter().map(Vec::len).min().unwrap_or(0);
    if m < 2 || n < 2 {
        return f64::NAN;
    }

    let means: Vec<f64> = chains.iter().map(|c| mean(&c[..n])).collect();
    let grand = mean(&means);
    let b = n as f64 / (m - 1) as f64 * means.iter().map(|x| (x - grand).powi(2)).sum::<f64>();
    let w = mean(
        &chains
            .iter()
            .map(|c| variance(&c[..n], 1))
            .collect::<Vec<_>>(),
    );
    if w == 0.0 {
        return if b == 0.0 { 1.0 } else { f64::INFINITY };
    }

    let var_plus = (n as f64 - 1.0) / n as f64 * w + b / n as f64;
    (var_plus / w).sqrt()
}

/// Posterior summary of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    /// Central 95% interval.
    pub lower_95: f64,
    pub upper_95: f64,
}

impl SummaryStats {
    pub fn from_samples(values: &[f64]) -> Self {
        let (lower_95, upper_95) = central_interval(values, 0.95);
        Self {
            mean: mean(values),
            std: std_dev(values),
            median: median(values),
            lower_95,
            upper_95,
        }
    }
}
