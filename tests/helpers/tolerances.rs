//! Tolerance constants for audio testing.
//!
//! Different checks need different precision levels.

/// Floating point rounding errors (exact copies).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Silence threshold (~-80dB).
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Relative error allowed on a frequency estimate.
pub const FREQUENCY_TOLERANCE: f64 = 0.05;

/// Relative error allowed on output duration.
pub const DURATION_TOLERANCE: f64 = 0.02;

/// 16-bit quantization step size.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;
