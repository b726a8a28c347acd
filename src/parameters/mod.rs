//! # Parameter System
//!
//! Named fit parameters with a `vary` flag and optional bounds. A fit that
//! needs `intercept = 0` holds `b` fixed; a bounded parameter is mapped through
//! a Minuit-style transform so the solver can move freely in an unbounded space.
//!
//! ```rust
//! use echem_fit::parameters::{Parameter, Parameters};
//!
//! let mut params = Parameters::new();
//! params.add_param("m", 1.0).unwrap();
//! params.add(Parameter::fixed("b", 0.0)).unwrap();
//! params.add_param_with_bounds("ilim", 3.0, 0.0, 30.0).unwrap();
//!
//! assert_eq!(params.varying_count(), 2);
//! ```

pub mod bounds;
pub mod parameter;
pub mod parameters;

pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;
