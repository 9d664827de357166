use thiserror::Error;

/// Rejection from the validation layer. Structured so the API can name the
/// offending field and the bound that was broken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("device_id must not be empty")]
    EmptyDeviceId,

    #[error("device_id exceeds {max} characters")]
    DeviceIdTooLong { max: usize },

    #[error("{field} {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyDeviceId | ValidationError::DeviceIdTooLong { .. } => "device_id",
            ValidationError::OutOfRange { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
