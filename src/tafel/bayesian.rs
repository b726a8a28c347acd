//! Bayesian Tafel analysis.
//!
//! The fit runs in four phases, and a failure in any of them ends the whole
//! operation:
//!
//! 1. **Pre-fit**: a Levenberg-Marquardt fit of the model to the shifted
//!    log-current, restarted from random guesses until it converges with
//!    strictly positive parameters.
//! 2. **Bounds**: a uniform prior box `[0, 10 p*]` around the pre-fit.
//! 3. **Sampling**: Metropolis draws from the posterior under a Gaussian
//!    likelihood with fixed `sigma`, retried on sampler failure.
//! 4. **Summary**: posterior means, the Tafel slope of the mean parameter
//!    vector, and a dense fit curve with the shift added back.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_min_len, ensure_same_len, EchemError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig, RandomRestarts};
use crate::problem::Problem;
use crate::sampling::{MetropolisSampler, PosteriorSample, SamplerConfig};
use crate::uncertainty::statistics;

use super::models::{SeriesResistanceModel, TafelModel};

/// Upper prior bound as a multiple of the pre-fit value.
pub const PRIOR_BOUND_FACTOR: f64 = 10.0;

/// Points in the resampled fit curve.
pub const DENSE_POINTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianTafelConfig {
    /// Standard deviation of the observation noise, in log10 units.
    pub sigma: f64,
    /// Kept draws per chain.
    pub nsamples: usize,
    /// Sampler attempts.
    pub retries: usize,
    pub tune: usize,
    pub chains: usize,
    pub seed: u64,
    /// Cap on pre-fit attempts.
    pub max_restarts: usize,
    pub prefit_iterations: usize,
}

impl Default for BayesianTafelConfig {
    fn default() -> Self {
        let sampler = SamplerConfig::default();
        Self {
            sigma: 0.1,
            nsamples: sampler.draws,
            retries: sampler.retries,
            tune: sampler.tune,
            chains: sampler.chains,
            seed: sampler.seed,
            max_restarts: crate::lm::restarts::DEFAULT_MAX_ATTEMPTS,
            prefit_iterations: 200,
        }
    }
}

impl BayesianTafelConfig {
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_nsamples(mut self, nsamples: usize) -> Self {
        self.nsamples = nsamples;
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_tune(mut self, tune: usize) -> Self {
        self.tune = tune;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig::default()
            .with_draws(self.nsamples)
            .with_tune(self.tune)
            .with_chains(self.chains)
            .with_retries(self.retries)
            .with_seed(self.seed)
    }
}

/// Everything the Bayesian fit produces.
#[derive(Debug, Clone, Serialize)]
pub struct BayesianTafelFit {
    pub model: String,
    pub parameter_names: Vec<String>,
    /// Tafel slope of the posterior-mean parameters, mV/decade.
    pub slope_mv_per_decade: Option<f64>,
    /// Standard deviation of the slope over the posterior draws.
    pub slope_std: Option<f64>,
    pub prefit: Vec<f64>,
    pub prefit_attempts: usize,
    pub bounds: Vec<(f64, f64)>,
    pub posterior_mean: Vec<f64>,
    pub posterior: PosteriorSample,
    pub fit_potential: Vec<f64>,
    pub fit_log_current: Vec<f64>,
    /// Minimum log-current subtracted before fitting.
    pub log_current_shift: f64,
    /// Minimum potential subtracted before fitting.
    pub potential_offset: f64,
}

/// Residuals of a model against shifted observations.
struct ModelResiduals<'a, M: ?Sized> {
    model: &'a M,
    v: &'a [f64],
    y: &'a [f64],
}

impl<M: TafelModel + ?Sized> Problem for ModelResiduals<'_, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let p = params.to_vec();
        Ok(self
            .v
            .iter()
            .zip(self.y)
            .map(|(&v, &y)| self.model.evaluate(v, &p) - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.v.len()
    }
}

/// Runs the pre-fit, prior construction and sampling for one model.
#[derive(Debug, Clone)]
pub struct BayesianFitter<M> {
    model: M,
    config: BayesianTafelConfig,
}

impl<M: TafelModel> BayesianFitter<M> {
    pub fn new(model: M, config: BayesianTafelConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Fit `log10|current|` against `potential`.
    ///
    /// The model sees the potential offset to start at zero, so data must be
    /// oriented with overpotential increasing along the potential axis.
    pub fn fit(&self, potential: &[f64], current: &[f64]) -> Result<BayesianTafelFit> {
        ensure_same_len("potential and current", potential.len(), current.len())?;
        ensure_min_len(self.model.parameter_count().max(2), potential.len())?;
        if !(self.config.sigma.is_finite() && self.config.sigma > 0.0) {
            return Err(EchemError::InvalidParameter(format!(
                "sigma must be positive, got {}",
                self.config.sigma
            )));
        }

        let log_current = current
            .iter()
            .map(|&i| {
                if i == 0.0 || !i.is_finite() {
                    Err(EchemError::InputShape(format!(
                        "cannot take the logarithm of current {}",
                        i
                    )))
                } else {
                    Ok(i.abs().log10())
                }
            })
            .collect::<Result<Vec<f64>>>()?;
        if potential.iter().any(|e| !e.is_finite()) {
            return Err(EchemError::InputShape(
                "potential contains non-finite values".to_string(),
            ));
        }

        let shift = log_current.iter().copied().fold(f64::INFINITY, f64::min);
        let offset = potential.iter().copied().fold(f64::INFINITY, f64::min);
        let y: Vec<f64> = log_current.iter().map(|l| l - shift).collect();
        let v: Vec<f64> = potential.iter().map(|e| e - offset).collect();

        let (prefit, prefit_attempts) = self.prefit(&v, &y)?;
        log::info!(
            "{} pre-fit converged after {} attempt(s): {:?}",
            self.model.name(),
            prefit_attempts,
            prefit
        );

        let bounds: Vec<(f64, f64)> = prefit.iter().map(|&p| (0.0, PRIOR_BOUND_FACTOR * p)).collect();
        let names: Vec<String> = self
            .model
            .parameter_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        let inv_var = 1.0 / (self.config.sigma * self.config.sigma);
        let model = &self.model;
        let log_density = |p: &[f64]| {
            let ss: f64 = v
                .iter()
                .zip(&y)
                .map(|(&vi, &yi)| (model.evaluate(vi, p) - yi).powi(2))
                .sum();
            -0.5 * ss * inv_var
        };
        let posterior = MetropolisSampler::new(self.config.sampler_config())
            .sample(&names, &bounds, &prefit, log_density)?;
        log::info!("drew {} posterior samples", posterior.len());

        let posterior_mean = posterior.mean_vector();
        let slope_mv_per_decade = self.model.tafel_slope(&posterior_mean);
        let slope_std = slope_mv_per_decade.map(|_| {
            let slopes: Vec<f64> = posterior
                .draws()
                .filter_map(|d| self.model.tafel_slope(&d))
                .collect();
            statistics::std_dev(&slopes)
        });

        let (fit_potential, fit_log_current) =
            self.dense_curve(potential, offset, shift, &posterior_mean);

        Ok(BayesianTafelFit {
            model: self.model.name().to_string(),
            parameter_names: names,
            slope_mv_per_decade,
            slope_std,
            prefit,
            prefit_attempts,
            bounds,
            posterior_mean,
            posterior,
            fit_potential,
            fit_log_current,
            log_current_shift: shift,
            potential_offset: offset,
        })
    }

    fn prefit(&self, v: &[f64], y: &[f64]) -> Result<(Vec<f64>, usize)> {
        let problem = ModelResiduals {
            model: &self.model,
            v,
            y,
        };
        let solver = LevenbergMarquardt::with_config(LmConfig {
            max_iterations: self.config.prefit_iterations,
            ..LmConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let names = self.model.parameter_names();

        RandomRestarts::new(self.config.max_restarts).run(
            &mut rng,
            &self.model.initial_guess(),
            |guess| {
                let result = solver.minimize(&problem, Array1::from(guess.to_vec()))?;
                if !result.success {
                    return Err(EchemError::Convergence(result.message));
                }
                if let Some(k) = result.params.iter().position(|p| !(p.is_finite() && *p > 0.0)) {
                    return Err(EchemError::Convergence(format!(
                        "pre-fit parameter {} = {} is not positive",
                        names[k], result.params[k]
                    )));
                }
                Ok(result.params.to_vec())
            },
        )
    }

    fn dense_curve(&self, potential: &[f64], offset: f64, shift: f64, params: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let hi = potential.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let step = (hi - offset) / (DENSE_POINTS - 1) as f64;
        let dense: Vec<f64> = (0..DENSE_POINTS).map(|k| offset + step * k as f64).collect();
        let log_i = dense
            .iter()
            .map(|e| self.model.evaluate(e - offset, params) + shift)
            .collect();
        (dense, log_i)
    }
}

/// Bayesian Tafel slope with the series-resistance model.
///
/// `sigma` is the observation noise in log10 units, `nsamples` the kept draws
/// per chain and `retries` the number of sampler attempts. Any current may be
/// negative (cathodic) but none may be zero.
pub fn fit_tafel_slope_bayesian(
    potential: &[f64],
    current: &[f64],
    sigma: f64,
    nsamples: usize,
    retries: usize,
) -> Result<BayesianTafelFit> {
    let config = BayesianTafelConfig::default()
        .with_sigma(sigma)
        .with_nsamples(nsamples)
        .with_retries(retries);
    BayesianFitter::new(SeriesResistanceModel, config).fit(potential, current)
}
