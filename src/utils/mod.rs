//! Numerical helpers shared by the fitting routines.

pub mod finite_difference;
