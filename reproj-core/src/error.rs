use thiserror::Error;

/// Common errors across the reprojection pipeline
#[derive(Error, Debug)]
pub enum ReprojError {
    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Invalid calibration: {field} must be positive and finite (got {value})")]
    InvalidCalibration { field: &'static str, value: f32 },

    #[error("Missing calibration field: {0}")]
    MissingField(String),

    #[error("Failed to parse calibration field {field}: {value:?}")]
    Malformed { field: String, value: String },

    #[error("Calibration read failed: {0}")]
    Unreadable(String),
}

pub type Result<T> = std::result::Result<T, ReprojError>;
