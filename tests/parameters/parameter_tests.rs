use approx::assert_relative_eq;
use echem_fit::parameters::{Bounds, BoundsTransform, Parameter, ParameterError};

#[test]
fn test_parameter_lifecycle() {
    let mut param = Parameter::new("alpha", 15.0);
    assert!(param.vary());
    assert!(param.stderr().is_none());

    param.set_bounds(0.0, 150.0).unwrap();
    assert_eq!(param.min(), 0.0);
    assert_eq!(param.max(), 150.0);

    param.set_value(42.0).unwrap();
    param.set_stderr(Some(0.5));
    assert_eq!(param.value(), 42.0);
    assert_eq!(param.stderr(), Some(0.5));

    param.set_vary(false);
    assert!(!param.vary());
}

#[test]
fn test_narrowing_bounds_clamps_value() {
    let mut param = Parameter::new("ilim", 40.0);
    param.set_bounds(0.0, 30.0).unwrap();
    assert_eq!(param.value(), 30.0);

    assert!(matches!(
        param.set_bounds(5.0, 1.0),
        Err(ParameterError::Bounds(_))
    ));
}

#[test]
fn test_internal_coordinate_round_trip() {
    for (min, max, value) in [
        (0.0, 150.0, 15.0),
        (0.0, f64::INFINITY, 2.0),
        (f64::NEG_INFINITY, 0.0, -3.5),
        (f64::NEG_INFINITY, f64::INFINITY, 0.25),
    ] {
        let param = Parameter::with_bounds("p", value, min, max).unwrap();
        let internal = param.to_internal().unwrap();
        assert_relative_eq!(param.from_internal(internal), value, epsilon = 1e-10);
    }
}

#[test]
fn test_transform_never_leaves_interval() {
    let transform = BoundsTransform::new(Bounds::new(0.0, 10.0).unwrap());
    for k in -200..=200 {
        let external = transform.to_external(k as f64 * 0.05);
        assert!((0.0..=10.0).contains(&external), "{}", external);
    }
}

#[test]
fn test_degenerate_interval() {
    let param = Parameter::with_bounds("b", 1.0, 2.0, 2.0).unwrap();
    assert_eq!(param.value(), 2.0);
    assert_eq!(param.to_internal().unwrap(), 0.0);
    assert_eq!(param.from_internal(123.0), 2.0);
}
