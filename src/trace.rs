//! Voltammetry traces and scan-rate families.

use serde::Serialize;

use crate::error::{ensure_same_len, EchemError, Result};

/// One sweep of (potential, current) pairs in acquisition order.
///
/// Potential is in volts and current in milliamps. Potentials need not be
/// monotonic; a cyclic sweep goes down and back up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    potential: Vec<f64>,
    current: Vec<f64>,
    cycle: Option<Vec<i64>>,
}

impl Trace {
    pub fn new(potential: Vec<f64>, current: Vec<f64>) -> Result<Self> {
        ensure_same_len("potential and current", potential.len(), current.len())?;
        if potential.len() < 2 {
            return Err(EchemError::InputShape(format!(
                "a trace needs at least 2 points, got {}",
                potential.len()
            )));
        }
        if potential.iter().chain(&current).any(|v| !v.is_finite()) {
            return Err(EchemError::InputShape(
                "trace contains non-finite values".to_string(),
            ));
        }
        Ok(Self {
            potential,
            current,
            cycle: None,
        })
    }

    /// Attach a per-point cycle index.
    pub fn with_cycles(mut self, cycle: Vec<i64>) -> Result<Self> {
        ensure_same_len("potential and cycle", self.potential.len(), cycle.len())?;
        self.cycle = Some(cycle);
        Ok(self)
    }

    pub fn potential(&self) -> &[f64] {
        &self.potential
    }

    pub fn current(&self) -> &[f64] {
        &self.current
    }

    pub fn cycles(&self) -> Option<&[i64]> {
        self.cycle.as_deref()
    }

    pub fn len(&self) -> usize {
        self.potential.len()
    }

    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }

    /// Keep only the points recorded during `cycle`.
    pub fn select_cycle(&self, cycle: i64) -> Result<Trace> {
        let cycles = self.cycle.as_ref().ok_or_else(|| {
            EchemError::InputShape("trace has no cycle column to select from".to_string())
        })?;

        let (potential, current): (Vec<f64>, Vec<f64>) = cycles
            .iter()
            .zip(self.potential.iter().zip(&self.current))
            .filter(|(c, _)| **c == cycle)
            .map(|(_, (&e, &i))| (e, i))
            .unzip();
        let n = potential.len();
        Trace::new(potential, current)
            .map_err(|_| EchemError::InputShape(format!("cycle {} has {} points", cycle, n)))
            .map(|t| Trace {
                cycle: Some(vec![cycle; n]),
                ..t
            })
    }

    /// `(min, max)` of the potential.
    pub fn potential_range(&self) -> (f64, f64) {
        self.potential
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

/// CV traces keyed by scan rate (mV/s), kept in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanFamily {
    entries: Vec<(f64, Trace)>,
}

impl ScanFamily {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a family from `(scan_rate, trace)` pairs.
    pub fn from_traces<I>(traces: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, Trace)>,
    {
        let mut family = Self::new();
        for (rate, trace) in traces {
            family.insert(rate, trace)?;
        }
        Ok(family)
    }

    /// Add a trace; the rate must be positive, finite and not yet present.
    pub fn insert(&mut self, scan_rate: f64, trace: Trace) -> Result<()> {
        if !(scan_rate.is_finite() && scan_rate > 0.0) {
            return Err(EchemError::InputShape(format!(
                "scan rate must be strictly positive, got {}",
                scan_rate
            )));
        }
        if self.entries.iter().any(|(r, _)| *r == scan_rate) {
            return Err(EchemError::InputShape(format!(
                "duplicate scan rate {}",
                scan_rate
            )));
        }
        self.entries.push((scan_rate, trace));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.entries.iter().map(|(r, _)| *r).collect()
    }

    pub fn get(&self, scan_rate: f64) -> Option<&Trace> {
        self.entries
            .iter()
            .find(|(r, _)| *r == scan_rate)
            .map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &Trace)> {
        self.entries.iter().map(|(r, t)| (*r, t))
    }

    /// A copy without the listed scan rates.
    pub fn exclude_rates(&self, rates: &[f64]) -> ScanFamily {
        ScanFamily {
            entries: self
                .entries
                .iter()
                .filter(|(r, _)| !rates.contains(r))
                .cloned()
                .collect(),
        }
    }

    /// Check that every trace spans the same potential window within
    /// `tolerance` volts. Mismatches are logged and returned, not rejected.
    pub fn check_sweep_ranges(&self, tolerance: f64) -> bool {
        let Some((_, first)) = self.entries.first() else {
            return true;
        };
        let (lo0, hi0) = first.potential_range();
        let mut consistent = true;
        for (rate, trace) in &self.entries[1..] {
            let (lo, hi) = trace.potential_range();
            if (lo - lo0).abs() > tolerance || (hi - hi0).abs() > tolerance {
                log::warn!(
                    "scan at {} mV/s sweeps [{:.4}, {:.4}] V, first scan sweeps [{:.4}, {:.4}] V",
                    rate,
                    lo,
                    hi,
                    lo0,
                    hi0
                );
                consistent = false;
            }
        }
        consistent
    }
}
