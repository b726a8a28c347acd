//! Markov chain Monte Carlo over bounded parameters.
//!
//! [`MetropolisSampler`] draws from an unnormalized log density restricted to
//! a box; [`PosteriorSample`] holds the kept draws with their diagnostics.

mod metropolis;
mod posterior;

pub use metropolis::{MetropolisSampler, SamplerConfig};
pub use posterior::PosteriorSample;
