//! Distance calibration and range validation
//!
//! A calibration model maps a raw measured distance to a corrected one via a
//! polynomial of configurable degree. Parameter arity is checked once at
//! construction, so evaluation itself has no failure mode.

use crate::validation::error::ConfigError;

/// Calibration polynomial selected at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CalibrationModel {
    /// Identity: the raw distance is returned unchanged.
    #[default]
    None,
    /// k * x + b
    Linear { k: f64, b: f64 },
    /// a * x^2 + b * x + c
    Quadratic { a: f64, b: f64, c: f64 },
    /// a * x^3 + b * x^2 + c * x + d
    Cubic { a: f64, b: f64, c: f64, d: f64 },
}

impl CalibrationModel {
    /// Build a model from the configuration surface.
    ///
    /// The parameter list must exactly match the variant's arity; `none`
    /// takes no parameters into account.
    pub fn from_config(kind: &str, params: &[f64]) -> Result<Self, ConfigError> {
        match kind {
            "none" => Ok(CalibrationModel::None),
            "linear" => match params {
                [k, b] => Ok(CalibrationModel::Linear { k: *k, b: *b }),
                _ => Err(ConfigError::CalibrationArity {
                    kind: "linear",
                    expected: 2,
                    got: params.len(),
                }),
            },
            "quadratic" => match params {
                [a, b, c] => Ok(CalibrationModel::Quadratic {
                    a: *a,
                    b: *b,
                    c: *c,
                }),
                _ => Err(ConfigError::CalibrationArity {
                    kind: "quadratic",
                    expected: 3,
                    got: params.len(),
                }),
            },
            "cubic" => match params {
                [a, b, c, d] => Ok(CalibrationModel::Cubic {
                    a: *a,
                    b: *b,
                    c: *c,
                    d: *d,
                }),
                _ => Err(ConfigError::CalibrationArity {
                    kind: "cubic",
                    expected: 4,
                    got: params.len(),
                }),
            },
            other => Err(ConfigError::UnknownCalibration {
                kind: other.to_string(),
            }),
        }
    }

    /// Evaluate the polynomial at `raw`. Pure, no side effects.
    pub fn apply(&self, raw: f64) -> f64 {
        match *self {
            CalibrationModel::None => raw,
            CalibrationModel::Linear { k, b } => k * raw + b,
            CalibrationModel::Quadratic { a, b, c } => a * raw * raw + b * raw + c,
            CalibrationModel::Cubic { a, b, c, d } => {
                a * raw * raw * raw + b * raw * raw + c * raw + d
            }
        }
    }
}

/// Inclusive-bounds check on a calibrated distance.
pub fn in_range(min: f64, max: f64, value: f64) -> bool {
    min <= value && value <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let model = CalibrationModel::from_config("none", &[]).unwrap();
        assert_eq!(model.apply(5.0), 5.0);
        assert_eq!(model.apply(-1.25), -1.25);
    }

    #[test]
    fn test_linear_calibration() {
        let model = CalibrationModel::from_config("linear", &[2.0, 1.0]).unwrap();
        assert_eq!(model.apply(5.0), 11.0);

        // Linear(1, 0) is the identity
        let identity = CalibrationModel::Linear { k: 1.0, b: 0.0 };
        assert_eq!(identity.apply(10.0), 10.0);
    }

    #[test]
    fn test_quadratic_calibration() {
        // x^2 + 2x + 1 at x=2 is 9
        let model = CalibrationModel::from_config("quadratic", &[1.0, 2.0, 1.0]).unwrap();
        assert_eq!(model.apply(2.0), 9.0);
    }

    #[test]
    fn test_cubic_calibration() {
        // x^3 at x=2 is 8
        let model = CalibrationModel::from_config("cubic", &[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(model.apply(2.0), 8.0);
    }

    #[test]
    fn test_calibration_is_pure() {
        let model = CalibrationModel::Quadratic {
            a: 0.5,
            b: -1.0,
            c: 2.0,
        };
        assert_eq!(model.apply(3.0), model.apply(3.0));
    }

    #[test]
    fn test_arity_mismatch_fails_construction() {
        assert!(matches!(
            CalibrationModel::from_config("linear", &[1.0]),
            Err(ConfigError::CalibrationArity {
                kind: "linear",
                expected: 2,
                got: 1,
            })
        ));
        assert!(CalibrationModel::from_config("quadratic", &[1.0, 2.0, 3.0, 4.0]).is_err());
        assert!(CalibrationModel::from_config("cubic", &[]).is_err());
    }

    #[test]
    fn test_unknown_kind_fails_construction() {
        assert!(matches!(
            CalibrationModel::from_config("quartic", &[1.0; 5]),
            Err(ConfigError::UnknownCalibration { .. })
        ));
    }

    #[test]
    fn test_in_range_inclusive_bounds() {
        assert!(in_range(0.0, 100.0, 0.0));
        assert!(in_range(0.0, 100.0, 100.0));
        assert!(in_range(0.0, 100.0, 50.0));
        assert!(!in_range(0.0, 100.0, 100.0001));
        assert!(!in_range(0.0, 100.0, -0.0001));
    }
}
