//! Error types for tessitura-core.

use thiserror::Error;

/// Error type for tessitura-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid sample rate: {0}. Must be positive and finite")]
    InvalidSampleRate(f64),

    #[error("Invalid channel count: {0}. Must be at least 1")]
    InvalidChannels(usize),

    #[error("Channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch { expected: usize, got: usize },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Validate a sample rate, returning it unchanged when usable.
    pub fn check_sample_rate(sample_rate: f64) -> Result<f64> {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            Ok(sample_rate)
        } else {
            Err(Error::InvalidSampleRate(sample_rate))
        }
    }

    /// Validate a channel count, returning it unchanged when usable.
    pub fn check_channels(channels: usize) -> Result<usize> {
        if channels == 0 {
            Err(Error::InvalidChannels(channels))
        } else {
            Ok(channels)
        }
    }
}
