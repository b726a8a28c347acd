//! Component-wise random-walk Metropolis within box bounds.
//!
//! Each iteration proposes a Gaussian move on one parameter at a time and
//! accepts it with probability `min(1, exp(Δ log p))`. Proposals that leave
//! the box are rejected, which is the uniform prior. During tuning the
//! per-parameter step widths are adapted toward a target acceptance rate;
//! tuning draws are discarded.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{EchemError, Result};
use crate::sampling::PosteriorSample;

/// Sampler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Kept draws per chain.
    pub draws: usize,
    /// Discarded tuning iterations per chain.
    pub tune: usize,
    pub chains: usize,
    /// Attempts before giving up with a sampling error.
    pub retries: usize,
    pub seed: u64,
    /// Acceptance rate the step widths are tuned toward.
    pub target_acceptance: f64,
    /// Tuning iterations between step-width updates.
    pub adapt_interval: usize,
    /// R-hat above which a warning is logged.
    pub max_r_hat: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            draws: 2500,
            tune: 2000,
            chains: 2,
            retries: 5,
            seed: 0,
            target_acceptance: 0.44,
            adapt_interval: 50,
            max_r_hat: 1.1,
        }
    }
}

impl SamplerConfig {
    pub fn with_draws(mut self, draws: usize) -> Self {
        self.draws = draws;
        self
    }

    pub fn with_tune(mut self, tune: usize) -> Self {
        self.tune = tune;
        self
    }

    pub fn with_chains(mut self, chains: usize) -> Self {
        self.chains = chains;
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetropolisSampler {
    config: SamplerConfig,
}

impl MetropolisSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample `log_density` over the box `bounds`, starting near `start`.
    ///
    /// `log_density` may return `-inf` (or NaN) for impossible points. A run
    /// that cannot start, or in which some parameter never moves, is a
    /// transient failure and is retried with a fresh seed; after
    /// `retries` failed runs the result is `EchemError::Sampling`.
    pub fn sample<F>(
        &self,
        names: &[String],
        bounds: &[(f64, f64)],
        start: &[f64],
        log_density: F,
    ) -> Result<PosteriorSample>
    where
        F: Fn(&[f64]) -> f64,
    {
        self.validate(names, bounds, start)?;

        let attempts = self.config.retries.max(1);
        let mut last_error = String::new();
        for attempt in 0..attempts {
            let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(attempt as u64));
            match self.run(&mut rng, names, bounds, start, &log_density) {
                Ok(posterior) => {
                    for name in names {
                        if let Some(r_hat) = posterior.r_hat(name) {
                            if r_hat > self.config.max_r_hat {
                                log::warn!("parameter {} has R-hat {:.3}", name, r_hat);
                            }
                        }
                    }
                    return Ok(posterior);
                }
                Err(EchemError::Sampling(msg)) => {
                    log::warn!("sampling attempt {} of {} failed: {}", attempt + 1, attempts, msg);
                    last_error = msg;
                }
                Err(other) => return Err(other),
            }
        }

        Err(EchemError::Sampling(format!(
            "sampler failed after {} attempts; last failure: {}",
            attempts, last_error
        )))
    }

    fn validate(&self, names: &[String], bounds: &[(f64, f64)], start: &[f64]) -> Result<()> {
        if names.len() != bounds.len() || names.len() != start.len() {
            return Err(EchemError::DimensionMismatch(format!(
                "{} names, {} bounds and {} start values",
                names.len(),
                bounds.len(),
                start.len()
            )));
        }
        if names.is_empty() {
            return Err(EchemError::InvalidParameter(
                "nothing to sample: no parameters".to_string(),
            ));
        }
        if self.config.draws == 0 || self.config.chains == 0 {
            return Err(EchemError::InvalidParameter(
                "sampler needs at least one chain and one draw".to_string(),
            ));
        }
        for ((name, &(lo, hi)), &x) in names.iter().zip(bounds).zip(start) {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(EchemError::InvalidParameter(format!(
                    "parameter {} has an empty or infinite range [{}, {}]",
                    name, lo, hi
                )));
            }
            if !(lo..=hi).contains(&x) {
                return Err(EchemError::InvalidParameter(format!(
                    "start value {} of {} is outside [{}, {}]",
                    x, name, lo, hi
                )));
            }
        }
        Ok(())
    }

    fn run<R, F>(
        &self,
        rng: &mut R,
        names: &[String],
        bounds: &[(f64, f64)],
        start: &[f64],
        log_density: &F,
    ) -> Result<PosteriorSample>
    where
        R: Rng,
        F: Fn(&[f64]) -> f64,
    {
        let mut chains = Vec::with_capacity(self.config.chains);
        let mut acceptance = Vec::with_capacity(self.config.chains);

        for c in 0..self.config.chains {
            let init = self.chain_start(rng, bounds, start, log_density)?;
            let (draws, rates) = self.run_chain(rng, bounds, init, log_density);
            if let Some(p) = rates.iter().position(|&r| r == 0.0) {
                return Err(EchemError::Sampling(format!(
                    "chain {} never moved parameter {}",
                    c, names[p]
                )));
            }
            log::debug!("chain {} acceptance rates {:?}", c, rates);
            chains.push(draws);
            acceptance.push(rates);
        }

        Ok(PosteriorSample::new(names.to_vec(), chains, acceptance))
    }

    /// A jittered copy of `start` with finite log density, or `start` itself.
    fn chain_start<R, F>(
        &self,
        rng: &mut R,
        bounds: &[(f64, f64)],
        start: &[f64],
        log_density: &F,
    ) -> Result<(Vec<f64>, f64)>
    where
        R: Rng,
        F: Fn(&[f64]) -> f64,
    {
        let jittered: Vec<f64> = start
            .iter()
            .zip(bounds)
            .map(|(&x, &(lo, hi))| {
                let z: f64 = rng.sample(StandardNormal);
                (x + 0.01 * (hi - lo) * z).clamp(lo, hi)
            })
            .collect();

        for candidate in [jittered, start.to_vec()] {
            let lp = log_density(&candidate);
            if lp.is_finite() {
                return Ok((candidate, lp));
            }
        }
        Err(EchemError::Sampling(
            "log density is not finite at the starting point".to_string(),
        ))
    }

    /// Tune then draw one chain; returns `draws[p][k]` and per-parameter
    /// acceptance rates over the kept draws.
    fn run_chain<R, F>(
        &self,
        rng: &mut R,
        bounds: &[(f64, f64)],
        (mut x, mut lp): (Vec<f64>, f64),
        log_density: &F,
    ) -> (Vec<Vec<f64>>, Vec<f64>)
    where
        R: Rng,
        F: Fn(&[f64]) -> f64,
    {
        let n = x.len();
        let cfg = &self.config;
        let mut step: Vec<f64> = bounds.iter().map(|(lo, hi)| 0.1 * (hi - lo)).collect();
        let mut batch_accepts = vec![0usize; n];
        let mut kept_accepts = vec![0usize; n];
        let mut draws = vec![Vec::with_capacity(cfg.draws); n];
        let interval = cfg.adapt_interval.max(1);

        for iteration in 0..cfg.tune + cfg.draws {
            let tuning = iteration < cfg.tune;

            for j in 0..n {
                let z: f64 = rng.sample(StandardNormal);
                let proposal = x[j] + step[j] * z;
                let (lo, hi) = bounds[j];
                if proposal < lo || proposal > hi {
                    continue;
                }

                let old = x[j];
                x[j] = proposal;
                let lp_new = log_density(&x);
                let log_u = rng.gen::<f64>().ln();
                if lp_new.is_finite() && log_u < lp_new - lp {
                    lp = lp_new;
                    if tuning {
                        batch_accepts[j] += 1;
                    } else {
                        kept_accepts[j] += 1;
                    }
                } else {
                    x[j] = old;
                }
            }

            if tuning && (iteration + 1) % interval == 0 {
                for j in 0..n {
                    let rate = batch_accepts[j] as f64 / interval as f64;
                    let width = bounds[j].1 - bounds[j].0;
                    step[j] = (step[j] * (2.0 * (rate - cfg.target_acceptance)).exp())
                        .clamp(1e-12 * width, width);
                    batch_accepts[j] = 0;
                }
            }

            if !tuning {
                for j in 0..n {
                    draws[j].push(x[j]);
                }
            }
        }

        let rates = kept_accepts
            .iter()
            .map(|&a| a as f64 / cfg.draws as f64)
            .collect();
        (draws, rates)
    }
}
