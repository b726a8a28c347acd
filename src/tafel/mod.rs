//! Tafel-slope estimation.
//!
//! Two strategies share one entry point, [`fit_tafel`]:
//!
//! - [`TafelMethod::LeastSquares`] fits a straight line to `log10|j|` against
//!   potential and reports `|1000 / m|` mV/decade.
//! - [`TafelMethod::Bayesian`] fits a physical [`TafelModel`] by MCMC and
//!   reports the slope of the posterior-mean parameters.
//!
//! Raw curves go through [`prepare_tafel_data`] first.

pub mod bayesian;
mod lsq;
pub mod models;
mod prepare;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use bayesian::{fit_tafel_slope_bayesian, BayesianFitter, BayesianTafelConfig, BayesianTafelFit};
pub use lsq::{fit_tafel_slope_lsq, LsqTafelFit};
pub use models::{
    HeyrovskyHerModel, MarcusHushChidseyModel, SeriesResistanceModel, TafelModel,
};
pub use prepare::{prepare_tafel_data, TafelData, TafelPreparation, TafelWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TafelMethod {
    #[default]
    LeastSquares,
    Bayesian,
}

impl std::str::FromStr for TafelMethod {
    type Err = crate::error::EchemError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "least_squares" | "lsq" => Ok(Self::LeastSquares),
            "bayesian" => Ok(Self::Bayesian),
            other => Err(crate::error::EchemError::InvalidParameter(format!(
                "unknown Tafel method '{}'",
                other
            ))),
        }
    }
}

/// Method-specific detail behind a [`TafelResult`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TafelDiagnostic {
    LeastSquares(LsqTafelFit),
    Bayesian(Box<BayesianTafelFit>),
}

#[derive(Debug, Clone, Serialize)]
pub struct TafelResult {
    pub method: TafelMethod,
    pub slope_mv_per_decade: f64,
    /// Posterior standard deviation of the slope; Bayesian fits only.
    pub slope_std: Option<f64>,
    /// Coefficient of determination of the line; least squares only.
    pub r_squared: Option<f64>,
    pub fit_potential: Vec<f64>,
    pub fit_log_current: Vec<f64>,
    pub diagnostic: TafelDiagnostic,
}

/// Estimate the Tafel slope of prepared data.
///
/// The Bayesian path uses the series-resistance model.
pub fn fit_tafel(
    data: &TafelData,
    method: TafelMethod,
    bayesian: &BayesianTafelConfig,
) -> Result<TafelResult> {
    match method {
        TafelMethod::LeastSquares => {
            let fit = fit_tafel_slope_lsq(&data.potential, &data.log_current)?;
            Ok(TafelResult {
                method,
                slope_mv_per_decade: fit.slope_mv_per_decade,
                slope_std: None,
                r_squared: Some(fit.r_squared),
                fit_potential: fit.fit_potential.clone(),
                fit_log_current: fit.fit_log_current.clone(),
                diagnostic: TafelDiagnostic::LeastSquares(fit),
            })
        }
        TafelMethod::Bayesian => {
            let fit = BayesianFitter::new(SeriesResistanceModel, bayesian.clone())
                .fit(&data.potential, &data.current)?;
            let slope = fit.slope_mv_per_decade.unwrap_or(f64::NAN);
            Ok(TafelResult {
                method,
                slope_mv_per_decade: slope,
                slope_std: fit.slope_std,
                r_squared: None,
                fit_potential: fit.fit_potential.clone(),
                fit_log_current: fit.fit_log_current.clone(),
                diagnostic: TafelDiagnostic::Bayesian(Box::new(fit)),
            })
        }
    }
}
