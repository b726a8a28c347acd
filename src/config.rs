//! TOML analysis configuration.
//!
//! ```toml
//! [ecsa]
//! contour_potential = 0.15
//! specific_capacitance = 0.04
//! exclude_rates = [5.0]
//!
//! [tafel]
//! method = "bayesian"
//! ph = 14.0
//! ru = 120.0
//! potential_window = [-0.45, -0.25]
//!
//! [tafel.bayesian]
//! sigma = 0.05
//! nsamples = 2000
//!
//! [faradaic]
//! avg_current = 10.0
//! avg_current_err = 0.1
//! ```
//!
//! Every key is optional; missing keys take the library defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecsa::{EcsaOptions, DEFAULT_SWEEP_TOLERANCE};
use crate::error::Result;
use crate::potential::PotentialCorrection;
use crate::tafel::{BayesianTafelConfig, TafelMethod, TafelPreparation, TafelWindow};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub ecsa: EcsaConfig,
    pub tafel: TafelConfig,
    pub faradaic: FaradaicConfig,
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading configuration from {}", path.display());
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsaConfig {
    pub contour_potential: Option<f64>,
    pub specific_capacitance: f64,
    pub blank_capacitance: f64,
    pub exclude_rates: Vec<f64>,
    pub sweep_tolerance: f64,
    pub cycle: Option<i64>,
}

impl Default for EcsaConfig {
    fn default() -> Self {
        Self {
            contour_potential: None,
            specific_capacitance: 1.0,
            blank_capacitance: 0.0,
            exclude_rates: Vec::new(),
            sweep_tolerance: DEFAULT_SWEEP_TOLERANCE,
            cycle: None,
        }
    }
}

impl EcsaConfig {
    pub fn options(&self) -> EcsaOptions {
        EcsaOptions {
            specific_capacitance: self.specific_capacitance,
            blank_capacitance: self.blank_capacitance,
            exclude_rates: self.exclude_rates.clone(),
            sweep_tolerance: self.sweep_tolerance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TafelConfig {
    pub method: TafelMethod,
    pub ph: f64,
    pub ru: f64,
    pub surface_area: f64,
    pub reference_offset: Option<f64>,
    pub potential_window: Option<(f64, f64)>,
    pub log_current_window: Option<(f64, f64)>,
    pub cycle: Option<i64>,
    pub bayesian: BayesianTafelConfig,
}

impl Default for TafelConfig {
    fn default() -> Self {
        Self {
            method: TafelMethod::default(),
            ph: 0.0,
            ru: 0.0,
            surface_area: 1.0,
            reference_offset: None,
            potential_window: None,
            log_current_window: None,
            cycle: None,
            bayesian: BayesianTafelConfig::default(),
        }
    }
}

impl TafelConfig {
    pub fn preparation(&self) -> TafelPreparation {
        let mut correction = PotentialCorrection::default();
        if let Some(offset) = self.reference_offset {
            correction = correction.with_reference_offset(offset);
        }
        TafelPreparation {
            ph: self.ph,
            ru: self.ru,
            surface_area: self.surface_area,
            correction,
            window: TafelWindow {
                potential: self.potential_window,
                log_current: self.log_current_window,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaradaicConfig {
    pub avg_current: Option<f64>,
    pub avg_current_err: f64,
    pub cal_slope: Option<f64>,
    pub cal_intercept: f64,
}

impl Default for FaradaicConfig {
    fn default() -> Self {
        Self {
            avg_current: None,
            avg_current_err: 0.0,
            cal_slope: None,
            cal_intercept: 0.0,
        }
    }
}
