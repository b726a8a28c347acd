//! # echem-fit
//!
//! Curve fitting for electrochemical characterization: double-layer
//! capacitance and electrochemical surface area from scan-rate families,
//! Tafel slopes by least squares or Bayesian MCMC, and faradaic efficiency
//! from a calibration line.
//!
//! Every fit goes through a Levenberg-Marquardt solver over named,
//! optionally bounded parameters, with standard errors from the Jacobian.
//!
//! ## Basic Usage
//!
//! ```
//! use echem_fit::regression::linear_fit;
//! use echem_fit::potential::correct_potential;
//!
//! let fit = linear_fit(&[5.0, 20.0, 50.0], &[1.0, 4.0, 10.0], None, None).unwrap();
//! assert!((fit.slope - 0.2).abs() < 1e-8);
//!
//! let e_rhe = correct_potential(&[-0.5], &[-10.0], 14.0, 100.0).unwrap();
//! assert!((e_rhe[0] - (-0.5 + 0.210 + 0.059 * 14.0 + 1.0)).abs() < 1e-12);
//! ```

pub mod error;

pub mod parameters;

pub mod problem;
pub mod problem_params;

pub mod lm;
pub mod sampling;
pub mod uncertainty;
mod utils;

pub mod contour;
pub mod ecsa;
pub mod faradaic;
pub mod potential;
pub mod regression;
pub mod tafel;
pub mod trace;

pub mod config;
pub mod io;

pub use error::{EchemError, Result};
pub use lm::LevenbergMarquardt;
pub use problem::Problem;

pub use contour::{fit_potential_contour, ContourTable};
pub use ecsa::{calculate_ecsa, EcsaResult};
pub use faradaic::{faradaic_efficiency, median_current};
pub use potential::correct_potential;
pub use regression::{linear_fit, FitResult};
pub use tafel::{fit_tafel_slope_bayesian, fit_tafel_slope_lsq, TafelMethod, TafelResult};
pub use trace::{ScanFamily, Trace};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
