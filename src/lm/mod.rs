//! Levenberg-Marquardt algorithm implementation.
//!
//! Nonlinear least squares with a damped Gauss-Newton step, used for the
//! chi-squared line fits and for the Tafel model pre-fits. [`RandomRestarts`]
//! wraps a fit with randomized retries for models whose cost surface has
//! more than one basin.

pub mod algorithm;
pub mod config;
pub mod restarts;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use restarts::RandomRestarts;
