//! End-to-end tests of the analysis pipelines.

mod ecsa_pipeline;
mod faradaic;
mod io_config;
mod regression;
mod tafel_pipeline;
