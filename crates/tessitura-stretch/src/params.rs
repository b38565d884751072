//! Pitch, tempo and rate parameters.

use serde::{Deserialize, Serialize};

use crate::error::{check_factor, Result};

/// Convert a semitone offset to a frequency ratio: `2^(semitones/12)`.
#[inline]
pub fn semitones_to_ratio(semitones: f64) -> f64 {
    2.0_f64.powf(semitones / 12.0)
}

/// Convert an octave offset to a frequency ratio: `2^octaves`.
#[inline]
pub fn octaves_to_ratio(octaves: f64) -> f64 {
    2.0_f64.powf(octaves)
}

/// Convert a percent change to a factor: `+50` → `1.5`, `-50` → `0.5`.
#[inline]
pub fn percent_to_factor(percent: f64) -> f64 {
    1.0 + 0.01 * percent
}

/// User-facing pitch/tempo/rate triple.
///
/// ## Range Limits
///
/// The builder setters clamp to the documented host ranges:
///
/// - `rate`, `tempo`, `pitch`: 0.25 - 4.0
/// - semitone offsets: -24 to +24
///
/// Direct field writes are not clamped; the pipeline trusts what it is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchParams {
    /// Playback rate: changes pitch and duration together (1.0 = normal)
    pub rate: f64,

    /// Duration factor without pitch change (2.0 = twice as fast)
    pub tempo: f64,

    /// Frequency ratio without duration change (2.0 = one octave up)
    pub pitch: f64,
}

impl PitchParams {
    /// Minimum rate/tempo/pitch factor
    pub const MIN_FACTOR: f64 = 0.25;
    /// Maximum rate/tempo/pitch factor
    pub const MAX_FACTOR: f64 = 4.0;
    /// Minimum semitone offset (-2 octaves)
    pub const MIN_SEMITONES: f64 = -24.0;
    /// Maximum semitone offset (+2 octaves)
    pub const MAX_SEMITONES: f64 = 24.0;

    /// Neutral parameters (no effect)
    pub fn new() -> Self {
        Self {
            rate: 1.0,
            tempo: 1.0,
            pitch: 1.0,
        }
    }

    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate.clamp(Self::MIN_FACTOR, Self::MAX_FACTOR);
        self
    }

    pub fn tempo(mut self, tempo: f64) -> Self {
        self.tempo = tempo.clamp(Self::MIN_FACTOR, Self::MAX_FACTOR);
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch.clamp(Self::MIN_FACTOR, Self::MAX_FACTOR);
        self
    }

    pub fn pitch_semitones(self, semitones: f64) -> Self {
        let semitones = semitones.clamp(Self::MIN_SEMITONES, Self::MAX_SEMITONES);
        self.pitch(semitones_to_ratio(semitones))
    }

    pub fn pitch_octaves(self, octaves: f64) -> Self {
        self.pitch(octaves_to_ratio(octaves))
    }

    /// Resample factor handed to the rate transposer.
    #[inline]
    pub fn effective_rate(&self) -> f64 {
        self.rate * self.pitch
    }

    /// Duration factor handed to the stretcher.
    ///
    /// Dividing by pitch cancels the duration change the transposer introduces, so a
    /// pure pitch change keeps the output length.
    #[inline]
    pub fn effective_tempo(&self) -> f64 {
        self.tempo / self.pitch
    }

    /// Reject zero, negative or non-finite factors.
    pub fn validate(&self) -> Result<()> {
        check_factor("rate", self.rate)?;
        check_factor("tempo", self.tempo)?;
        check_factor("pitch", self.pitch)?;
        Ok(())
    }
}

impl Default for PitchParams {
    fn default() -> Self {
        Self::new()
    }
}
