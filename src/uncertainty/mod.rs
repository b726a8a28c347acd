//! # Uncertainty Calculation
//!
//! - Covariance and standard errors of fitted parameters from the Jacobian
//! - [`Measurement`]: a value with uncertainty and first-order propagation
//! - Sample statistics for posterior summaries and goodness of fit

mod covariance;
mod measurement;
pub mod statistics;

pub use covariance::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
    unscaled_covariance,
};
pub use measurement::Measurement;
pub use statistics::SummaryStats;
