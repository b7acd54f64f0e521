//! Error types for argument validation.

use thiserror::Error;

/// Errors produced when a refresh rate cannot be built from a caller value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// The value has a fractional part or is not finite.
    #[error("refresh rate must be a whole number of Hz, got {0}")]
    NotAnInteger(f64),

    /// The value is zero or negative.
    #[error("refresh rate must be at least 1 Hz, got {0}")]
    BelowMinimum(i64),

    /// The value does not fit the supported range.
    #[error("refresh rate {0} Hz is out of range")]
    OutOfRange(u64),

    /// The text could not be read as a number.
    #[error("refresh rate {0:?} is not a number")]
    Unparsable(String),
}
