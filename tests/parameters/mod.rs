//! Tests for the named parameter system and its solver adapter.

mod parameter_tests;
mod parameters_tests;
