//! From a raw polarization curve to windowed `(E_rhe, log10|j|)` pairs.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_same_len, EchemError, Result};
use crate::potential::{normalize_current, PotentialCorrection};

/// Inclusive potential and log-current windows; `None` keeps the full range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TafelWindow {
    pub potential: Option<(f64, f64)>,
    pub log_current: Option<(f64, f64)>,
}

impl TafelWindow {
    fn contains(&self, e: f64, log_i: f64) -> bool {
        let inside = |range: Option<(f64, f64)>, x: f64| range.map_or(true, |(lo, hi)| lo <= x && x <= hi);
        inside(self.potential, e) && inside(self.log_current, log_i)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TafelPreparation {
    pub ph: f64,
    /// Uncompensated resistance in mΩ.
    pub ru: f64,
    /// Area the current is divided by (cm² geometric or ECSA).
    pub surface_area: f64,
    pub correction: PotentialCorrection,
    pub window: TafelWindow,
}

impl Default for TafelPreparation {
    fn default() -> Self {
        Self {
            ph: 0.0,
            ru: 0.0,
            surface_area: 1.0,
            correction: PotentialCorrection::default(),
            window: TafelWindow::default(),
        }
    }
}

impl TafelPreparation {
    pub fn with_ph(mut self, ph: f64) -> Self {
        self.ph = ph;
        self
    }

    pub fn with_ru(mut self, ru: f64) -> Self {
        self.ru = ru;
        self
    }

    pub fn with_surface_area(mut self, area: f64) -> Self {
        self.surface_area = area;
        self
    }

    pub fn with_window(mut self, window: TafelWindow) -> Self {
        self.window = window;
        self
    }
}

/// Prepared Tafel data, all columns the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TafelData {
    /// Potential on the RHE scale (V).
    pub potential: Vec<f64>,
    /// Current divided by the surface area.
    pub current: Vec<f64>,
    /// `log10(|current|)`.
    pub log_current: Vec<f64>,
}

impl TafelData {
    pub fn len(&self) -> usize {
        self.potential.len()
    }

    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }
}

/// Drop zero currents, correct the potential, normalize the current and
/// window the result.
///
/// The potential correction uses the raw current (mA); the window is applied
/// to the corrected potential and the normalized log-current. At least two
/// points must survive.
pub fn prepare_tafel_data(
    potential: &[f64],
    current: &[f64],
    prep: &TafelPreparation,
) -> Result<TafelData> {
    ensure_same_len("potential and current", potential.len(), current.len())?;

    let (e, i): (Vec<f64>, Vec<f64>) = potential
        .iter()
        .zip(current)
        .filter(|(_, &i)| i != 0.0)
        .map(|(&e, &i)| (e, i))
        .unzip();
    if e.len() < current.len() {
        log::debug!("dropped {} zero-current points", current.len() - e.len());
    }

    let e_rhe = prep.correction.apply(&e, &i, prep.ph, prep.ru)?;
    let j = normalize_current(&i, prep.surface_area)?;

    let mut data = TafelData {
        potential: Vec::with_capacity(j.len()),
        current: Vec::with_capacity(j.len()),
        log_current: Vec::with_capacity(j.len()),
    };
    for (e, j) in e_rhe.into_iter().zip(j) {
        let log_j = j.abs().log10();
        if !(e.is_finite() && log_j.is_finite()) {
            return Err(EchemError::InputShape(
                "polarization curve contains non-finite values".to_string(),
            ));
        }
        if prep.window.contains(e, log_j) {
            data.potential.push(e);
            data.current.push(j);
            data.log_current.push(log_j);
        }
    }

    if data.len() < 2 {
        return Err(EchemError::InsufficientData {
            needed: 2,
            got: data.len(),
        });
    }
    Ok(data)
}
