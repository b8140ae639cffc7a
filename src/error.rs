//! Error types for heading estimation and sensor sources

use thiserror::Error;

/// Error type for compass operations
#[derive(Error, Debug)]
pub enum HeadingError {
    /// Underlying I/O failure (recording files, console output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in a sensor recording
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Gravity and magnetic field readings cannot span a rotation matrix
    #[error("Degenerate reading: gravity and magnetic field are parallel or zero")]
    DegenerateReading,

    /// Accelerometer magnitude is below the free-fall threshold
    #[error("Accelerometer magnitude too small (device in free fall?)")]
    FreeFall,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for compass operations
pub type Result<T> = std::result::Result<T, HeadingError>;
