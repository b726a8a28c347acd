//! Random-restart driver for nonlinear pre-fits.
//!
//! The first attempt uses the caller's guess; every later attempt draws a
//! fresh guess as `|N(0, 1)|` per parameter. The driver gives up after
//! `max_attempts` failed attempts.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{EchemError, Result};

/// Default cap on restart attempts.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomRestarts {
    pub max_attempts: usize,
}

impl Default for RandomRestarts {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RandomRestarts {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// Run `attempt` until it succeeds or the cap is reached.
    ///
    /// An attempt fails by returning `Convergence`, `Parameter` or
    /// `InvalidParameter`; any other error aborts immediately. Returns the
    /// first successful value and the 1-based attempt number it came from.
    pub fn run<T, R, F>(&self, rng: &mut R, initial_guess: &[f64], mut attempt: F) -> Result<(T, usize)>
    where
        R: Rng,
        F: FnMut(&[f64]) -> Result<T>,
    {
        let mut guess = initial_guess.to_vec();
        let mut last_error = String::from("no attempts were made");

        for n in 1..=self.max_attempts {
            match attempt(&guess) {
                Ok(value) => {
                    if n > 1 {
                        log::debug!("pre-fit succeeded on attempt {}", n);
                    }
                    return Ok((value, n));
                }
                Err(
                    err @ (EchemError::Convergence(_)
                    | EchemError::Parameter(_)
                    | EchemError::InvalidParameter(_)),
                ) => {
                    log::debug!("pre-fit attempt {} failed: {}", n, err);
                    last_error = err.to_string();
                }
                Err(err) => return Err(err),
            }

            for g in guess.iter_mut() {
                let z: f64 = rng.sample(StandardNormal);
                *g = z.abs();
            }
        }

        Err(EchemError::Convergence(format!(
            "pre-fit failed after {} attempts; last failure: {}",
            self.max_attempts, last_error
        )))
    }
}
