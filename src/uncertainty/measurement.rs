//! A value with a one-sigma uncertainty and first-order propagation.
//!
//! Inputs are treated as independent, so uncertainties of sums and
//! differences add in quadrature and relative uncertainties of products and
//! quotients add in quadrature.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub uncertainty: f64,
}

impl Measurement {
    /// A measured value; the uncertainty is stored as its absolute value.
    pub fn new(value: f64, uncertainty: f64) -> Self {
        Self {
            value,
            uncertainty: uncertainty.abs(),
        }
    }

    /// A value known exactly.
    pub fn exact(value: f64) -> Self {
        Self {
            value,
            uncertainty: 0.0,
        }
    }

    /// Uncertainty relative to the magnitude of the value (infinite at zero).
    pub fn relative_uncertainty(&self) -> f64 {
        if self.uncertainty == 0.0 {
            0.0
        } else {
            self.uncertainty / self.value.abs()
        }
    }

    /// Multiply by an exact constant.
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.value * factor, self.uncertainty * factor)
    }

    pub fn abs(self) -> Self {
        Self::new(self.value.abs(), self.uncertainty)
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Self::exact(value)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {}", self.value, self.uncertainty)
    }
}

impl Add for Measurement {
    type Output = Measurement;

    fn add(self, rhs: Measurement) -> Measurement {
        Measurement::new(self.value + rhs.value, self.uncertainty.hypot(rhs.uncertainty))
    }
}

impl Sub for Measurement {
    type Output = Measurement;

    fn sub(self, rhs: Measurement) -> Measurement {
        Measurement::new(self.value - rhs.value, self.uncertainty.hypot(rhs.uncertainty))
    }
}

impl Neg for Measurement {
    type Output = Measurement;

    fn neg(self) -> Measurement {
        Measurement::new(-self.value, self.uncertainty)
    }
}

impl Mul for Measurement {
    type Output = Measurement;

    fn mul(self, rhs: Measurement) -> Measurement {
        let value = self.value * rhs.value;
        // d(ab) = b da + a db
        let uncertainty = (rhs.value * self.uncertainty).hypot(self.value * rhs.uncertainty);
        Measurement::new(value, uncertainty)
    }
}

impl Div for Measurement {
    type Output = Measurement;

    fn div(self, rhs: Measurement) -> Measurement {
        let value = self.value / rhs.value;
        // d(a/b) = da / b - a db / b^2
        let uncertainty =
            (self.uncertainty / rhs.value).hypot(self.value * rhs.uncertainty / (rhs.value * rhs.value));
        Measurement::new(value, uncertainty)
    }
}
