//! Lock-free parameter channel between a control thread and the audio thread.

use tessitura_core::{AtomicFlag, AtomicFloat, ParameterRange};

use crate::node::BlockParams;

/// Shared pitch/tempo/rate controls.
///
/// Writers clamp every value to its documented range; the audio thread reads one
/// [`BlockParams`] snapshot per block. Share it behind an `Arc`.
///
/// ```
/// use std::sync::Arc;
/// use tessitura_stretch::PitchShiftControls;
///
/// let controls = Arc::new(PitchShiftControls::new());
/// controls.set_pitch_semitones(40.0);
/// assert_eq!(controls.snapshot().pitch_semitones, 24.0);
/// ```
#[derive(Debug)]
pub struct PitchShiftControls {
    rate: AtomicFloat,
    tempo: AtomicFloat,
    pitch: AtomicFloat,
    pitch_semitones: AtomicFloat,
    reset: AtomicFlag,
    factor_range: ParameterRange,
    semitone_range: ParameterRange,
}

impl PitchShiftControls {
    pub fn new() -> Self {
        Self {
            rate: AtomicFloat::new(1.0),
            tempo: AtomicFloat::new(1.0),
            pitch: AtomicFloat::new(1.0),
            pitch_semitones: AtomicFloat::new(0.0),
            reset: AtomicFlag::new(false),
            factor_range: ParameterRange::logarithmic(0.25, 4.0, 1.0),
            semitone_range: ParameterRange::linear(-24.0, 24.0, 0.0),
        }
    }

    /// Range shared by rate, tempo and pitch ratio.
    pub fn factor_range(&self) -> &ParameterRange {
        &self.factor_range
    }

    pub fn semitone_range(&self) -> &ParameterRange {
        &self.semitone_range
    }

    pub fn set_rate(&self, rate: f32) {
        self.rate.set(self.factor_range.clamp(rate));
    }

    pub fn set_tempo(&self, tempo: f32) {
        self.tempo.set(self.factor_range.clamp(tempo));
    }

    pub fn set_pitch(&self, pitch: f32) {
        self.pitch.set(self.factor_range.clamp(pitch));
    }

    pub fn set_pitch_semitones(&self, semitones: f32) {
        self.pitch_semitones.set(self.semitone_range.clamp(semitones));
    }

    /// Set the rate from a 0-1 slider position.
    pub fn set_rate_normalized(&self, normalized: f32) {
        self.rate.set(self.factor_range.denormalize(normalized));
    }

    pub fn set_tempo_normalized(&self, normalized: f32) {
        self.tempo.set(self.factor_range.denormalize(normalized));
    }

    pub fn set_pitch_normalized(&self, normalized: f32) {
        self.pitch.set(self.factor_range.denormalize(normalized));
    }

    pub fn set_pitch_semitones_normalized(&self, normalized: f32) {
        self.pitch_semitones
            .set(self.semitone_range.denormalize(normalized));
    }

    pub fn rate(&self) -> f32 {
        self.rate.get()
    }

    pub fn tempo(&self) -> f32 {
        self.tempo.get()
    }

    pub fn pitch(&self) -> f32 {
        self.pitch.get()
    }

    pub fn pitch_semitones(&self) -> f32 {
        self.pitch_semitones.get()
    }

    /// Ask the audio thread to drop buffered audio before its next block with input.
    pub fn request_reset(&self) {
        self.reset.set(true);
    }

    /// Consume a pending reset request.
    pub fn take_reset(&self) -> bool {
        self.reset.take()
    }

    /// Values for one block.
    #[inline]
    pub fn snapshot(&self) -> BlockParams {
        BlockParams {
            rate: self.rate.get(),
            tempo: self.tempo.get(),
            pitch: self.pitch.get(),
            pitch_semitones: self.pitch_semitones.get(),
        }
    }
}

impl Default for PitchShiftControls {
    fn default() -> Self {
        Self::new()
    }
}
