//! Ordered collection of parameters.
//!
//! Order is insertion order and is the order of the solver's parameter vector,
//! so the same `Parameters` always maps to the same array layout.

use crate::parameters::parameter::{Parameter, ParameterError};
use serde::{Deserialize, Serialize};

/// A collection of named parameters in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter; names must be unique.
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.contains(param.name()) {
            return Err(ParameterError::Duplicate {
                name: param.name().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    /// Add an unbounded, varying parameter.
    ///
    /// ```
    /// use echem_fit::parameters::Parameters;
    ///
    /// let mut params = Parameters::new();
    /// params.add_param("m", 0.0).unwrap();
    /// params.add_param_with_bounds("b", 1.0, 0.0, 10.0).unwrap();
    /// assert_eq!(params.names(), vec!["m", "b"]);
    /// ```
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    /// Value of a named parameter, or `NotFound`.
    pub fn value_of(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(Parameter::value)
            .ok_or_else(|| ParameterError::NotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(Parameter::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Parameters that vary during optimization, in order.
    pub fn varying(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.vary()).collect()
    }

    pub fn varying_count(&self) -> usize {
        self.params.iter().filter(|p| p.vary()).count()
    }

    /// External values of the varying parameters.
    pub fn varying_values(&self) -> Vec<f64> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(Parameter::value)
            .collect()
    }

    /// Internal (transformed) values of the varying parameters.
    pub fn varying_internal_values(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(Parameter::to_internal)
            .collect()
    }

    /// Attach standard errors to the varying parameters, in order.
    pub fn set_varying_stderr(&mut self, stderr: &[f64]) -> Result<(), ParameterError> {
        let expected = self.varying_count();
        if stderr.len() != expected {
            return Err(ParameterError::CountMismatch {
                expected,
                got: stderr.len(),
            });
        }
        for (param, &err) in self.params.iter_mut().filter(|p| p.vary()).zip(stderr) {
            param.set_stderr(Some(err));
        }
        Ok(())
    }

    /// Overwrite the varying parameters from internal coordinates.
    pub fn update_from_internal(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        self.update_varying(values, true)
    }

    /// Overwrite the varying parameters from external values (bounds are checked).
    pub fn update_from_external(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        self.update_varying(values, false)
    }

    fn update_varying(&mut self, values: &[f64], internal: bool) -> Result<(), ParameterError> {
        let expected = self.varying_count();
        if values.len() != expected {
            return Err(ParameterError::CountMismatch {
                expected,
                got: values.len(),
            });
        }

        let mut next = values.iter();
        for param in self.params.iter_mut().filter(|p| p.vary()) {
            // length checked above
            let Some(&v) = next.next() else { break };
            let external = if internal { param.from_internal(v) } else { v };
            param.set_value(external)?;
        }
        Ok(())
    }
}
