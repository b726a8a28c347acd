//! Tests for covariance estimation, error propagation and sample statistics.

mod covariance_tests;
mod measurement_tests;
mod statistics_tests;
