//! Branch currents of a CV family at a fixed potential.
//!
//! Each trace is split at its minimum potential into the two sweep legs, and
//! the current at the contour potential is interpolated on each leg. Outside a
//! leg's potential range the current is clamped to the value at the nearest
//! end of that range.

use serde::Serialize;

use crate::error::{EchemError, Result};
use crate::trace::{ScanFamily, Trace};

/// One row of the contour table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContourRow {
    pub scan_rate: f64,
    pub current_low: f64,
    pub current_high: f64,
}

/// Branch currents for every scan rate, in family order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourTable {
    pub potential: f64,
    pub rows: Vec<ContourRow>,
}

impl ContourTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn scan_rates(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.scan_rate).collect()
    }

    pub fn currents_low(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.current_low).collect()
    }

    pub fn currents_high(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.current_high).collect()
    }
}

/// Interpolate branch currents at `contour_potential` for every trace.
///
/// A family with a single trace is fine here; line fits downstream need two.
pub fn fit_potential_contour(family: &ScanFamily, contour_potential: f64) -> Result<ContourTable> {
    if !contour_potential.is_finite() {
        return Err(EchemError::InputShape(format!(
            "contour potential must be finite, got {}",
            contour_potential
        )));
    }

    let rows = family
        .iter()
        .map(|(scan_rate, trace)| {
            let (i1, i2) = branch_currents(trace, contour_potential).map_err(|e| match e {
                EchemError::InputShape(msg) => {
                    EchemError::InputShape(format!("scan at {} mV/s: {}", scan_rate, msg))
                }
                other => other,
            })?;
            Ok(ContourRow {
                scan_rate,
                current_low: i1.min(i2),
                current_high: i1.max(i2),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ContourTable {
        potential: contour_potential,
        rows,
    })
}

/// Currents on the two sweep legs at `potential`, in sweep order.
pub fn branch_currents(trace: &Trace, potential: f64) -> Result<(f64, f64)> {
    let e = trace.potential();
    let i = trace.current();

    // first index of the minimum potential
    let split = e
        .iter()
        .enumerate()
        .fold(0, |best, (k, &v)| if v < e[best] { k } else { best });
    if split == 0 {
        return Err(EchemError::InputShape(
            "minimum potential is the first point, so the first sweep leg is empty".to_string(),
        ));
    }

    let first = interpolate_leg(&e[..split], &i[..split], potential);
    let second = interpolate_leg(&e[split..], &i[split..], potential);
    Ok((first, second))
}

/// Linear interpolation on one leg, clamped outside the leg's range.
fn interpolate_leg(e: &[f64], i: &[f64], x: f64) -> f64 {
    for k in 1..e.len() {
        let (e0, e1) = (e[k - 1], e[k]);
        if (e0 <= x && x <= e1) || (e1 <= x && x <= e0) {
            if e1 == e0 {
                return i[k - 1];
            }
            return i[k - 1] + (i[k] - i[k - 1]) * (x - e0) / (e1 - e0);
        }
    }

    // outside the range: value at the nearest extreme potential
    let (mut lo, mut hi) = (0, 0);
    for k in 1..e.len() {
        if e[k] < e[lo] {
            lo = k;
        }
        if e[k] > e[hi] {
            hi = k;
        }
    }
    if x < e[lo] {
        i[lo]
    } else {
        i[hi]
    }
}
