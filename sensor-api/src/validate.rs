use crate::config::Bounds;
use crate::errors::ValidationError;
use crate::model::NewReading;

pub const MAX_DEVICE_ID_LEN: usize = 50;

/// A reading that passed validation. This is the only way into storage, so
/// out-of-range values cannot end up in the database.
#[derive(Debug, Clone)]
pub struct ValidReading(NewReading);

impl ValidReading {
    pub fn into_inner(self) -> NewReading {
        self.0
    }
}

impl std::ops::Deref for ValidReading {
    type Target = NewReading;

    fn deref(&self) -> &NewReading {
        &self.0
    }
}

/// Validates a candidate reading against the configured bounds. Checks run
/// in a fixed order and stop at the first failure, so a reading with several
/// problems reports one field.
pub fn validate(candidate: NewReading, bounds: &Bounds) -> Result<ValidReading, ValidationError> {
    // Validate device_id
    if candidate.device_id.is_empty() {
        return Err(ValidationError::EmptyDeviceId);
    }
    if candidate.device_id.chars().count() > MAX_DEVICE_ID_LEN {
        return Err(ValidationError::DeviceIdTooLong {
            max: MAX_DEVICE_ID_LEN,
        });
    }

    // Validate measurements, temperature first
    check_range(
        "temperature",
        candidate.temperature,
        bounds.min_temperature,
        bounds.max_temperature,
    )?;
    check_range(
        "humidity",
        candidate.humidity,
        bounds.min_humidity,
        bounds.max_humidity,
    )?;

    Ok(ValidReading(candidate))
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    // NaN and infinities fail here as well: both comparisons below are false
    // for NaN, so the finite check is explicit.
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(device_id: &str, temperature: f64, humidity: f64) -> NewReading {
        NewReading {
            device_id: device_id.to_string(),
            temperature,
            humidity,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_valid_reading() {
        let result = validate(reading("dev-1", 25.0, 60.0), &Bounds::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = Bounds::default();
        assert!(validate(reading("dev-1", -50.0, 0.0), &bounds).is_ok());
        assert!(validate(reading("dev-1", 150.0, 100.0), &bounds).is_ok());
    }

    #[test]
    fn test_temperature_too_high() {
        let result = validate(reading("dev-1", 200.0, 60.0), &Bounds::default());
        match result {
            Err(ValidationError::OutOfRange { field, value, .. }) => {
                assert_eq!(field, "temperature");
                assert_eq!(value, 200.0);
            }
            other => panic!("expected out-of-range temperature, got {:?}", other),
        }
    }

    #[test]
    fn test_temperature_too_low() {
        let result = validate(reading("dev-1", -50.1, 60.0), &Bounds::default());
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange {
                field: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn test_humidity_too_high() {
        let result = validate(reading("dev-1", 25.0, 120.0), &Bounds::default());
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange {
                field: "humidity",
                ..
            })
        ));
    }

    #[test]
    fn test_humidity_too_low() {
        let result = validate(reading("dev-1", 25.0, -0.1), &Bounds::default());
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange {
                field: "humidity",
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_measurement() {
        let bounds = Bounds::default();
        assert!(validate(reading("dev-1", f64::NAN, 60.0), &bounds).is_err());
        assert!(validate(reading("dev-1", 25.0, f64::INFINITY), &bounds).is_err());
    }

    #[test]
    fn test_empty_device_id() {
        let result = validate(reading("", 25.0, 60.0), &Bounds::default());
        assert_eq!(result.unwrap_err(), ValidationError::EmptyDeviceId);
    }

    #[test]
    fn test_device_id_too_long() {
        let long_id = "d".repeat(MAX_DEVICE_ID_LEN + 1);
        let result = validate(reading(&long_id, 25.0, 60.0), &Bounds::default());
        assert!(matches!(
            result,
            Err(ValidationError::DeviceIdTooLong { .. })
        ));
    }

    #[test]
    fn test_device_id_at_max_length() {
        let id = "d".repeat(MAX_DEVICE_ID_LEN);
        assert!(validate(reading(&id, 25.0, 60.0), &Bounds::default()).is_ok());
    }

    #[test]
    fn test_first_failure_wins() {
        // Both measurements invalid: temperature is checked first.
        let result = validate(reading("dev-1", 200.0, 120.0), &Bounds::default());
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange {
                field: "temperature",
                ..
            })
        ));
    }

    #[test]
    fn test_custom_bounds() {
        let bounds = Bounds {
            min_temperature: 0.0,
            max_temperature: 10.0,
            min_humidity: 0.0,
            max_humidity: 100.0,
        };
        assert!(validate(reading("dev-1", 25.0, 60.0), &bounds).is_err());
        assert!(validate(reading("dev-1", 5.0, 60.0), &bounds).is_ok());
    }
}
