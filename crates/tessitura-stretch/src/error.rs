//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tessitura_core::Error),

    /// Stretch window settings that cannot produce a usable geometry.
    #[error("Invalid stretch settings: {0}")]
    InvalidSettings(String),

    /// A rate, tempo or pitch factor that is zero, negative or not finite.
    #[error("Invalid {name}: {value}. Must be positive and finite")]
    InvalidFactor { name: &'static str, value: f64 },
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Check a multiplicative factor (rate, tempo, pitch ratio).
pub(crate) fn check_factor(name: &'static str, value: f64) -> Result<f64> {
    if is_valid_factor(value) {
        Ok(value)
    } else {
        Err(Error::InvalidFactor { name, value })
    }
}

#[inline]
pub(crate) fn is_valid_factor(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
