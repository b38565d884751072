//! Window geometry for the WSOLA stretcher.
//!
//! All sizes derive from three millisecond settings and the sample rate. The sequence
//! (analysis window) and seek lengths follow the tempo automatically unless configured:
//! faster tempo means shorter windows, so consecutive splices stay close together.

use serde::{Deserialize, Serialize};

use super::seek::SeekStrategy;
use crate::error::{Error, Result};

/// Overlap window length (ms) when none is configured.
pub const DEFAULT_OVERLAP_MS: f64 = 8.0;

/// Lower bound for the overlap window, in frames.
pub const MIN_OVERLAP_FRAMES: usize = 16;

/// Tempo range over which the automatic window lengths are interpolated.
pub const AUTO_TEMPO_LOW: f64 = 0.25;
pub const AUTO_TEMPO_HIGH: f64 = 4.0;

/// Sequence length (ms) at the slow and fast ends of the tempo range.
const AUTO_SEQUENCE_SLOW_MS: f64 = 125.0;
const AUTO_SEQUENCE_FAST_MS: f64 = 50.0;

/// Seek window length (ms) at the slow and fast ends of the tempo range.
const AUTO_SEEK_SLOW_MS: f64 = 25.0;
const AUTO_SEEK_FAST_MS: f64 = 15.0;

/// Clamped linear map from tempo to milliseconds, rounded to a whole millisecond.
fn auto_ms(tempo: f64, slow_ms: f64, fast_ms: f64) -> f64 {
    let slope = (fast_ms - slow_ms) / (AUTO_TEMPO_HIGH - AUTO_TEMPO_LOW);
    let intercept = slow_ms - slope * AUTO_TEMPO_LOW;
    let ms = (intercept + slope * tempo).clamp(fast_ms, slow_ms);
    (ms + 0.5).floor()
}

/// Sequence length chosen for `tempo` when not configured.
pub fn auto_sequence_ms(tempo: f64) -> f64 {
    auto_ms(tempo, AUTO_SEQUENCE_SLOW_MS, AUTO_SEQUENCE_FAST_MS)
}

/// Seek window length chosen for `tempo` when not configured.
pub fn auto_seek_window_ms(tempo: f64) -> f64 {
    auto_ms(tempo, AUTO_SEEK_SLOW_MS, AUTO_SEEK_FAST_MS)
}

/// Overlap length in frames: at least 16 and a multiple of 8.
pub fn overlap_frames(sample_rate: f64, overlap_ms: f64) -> usize {
    let frames = (sample_rate * overlap_ms / 1000.0).max(MIN_OVERLAP_FRAMES as f64) as usize;
    frames - frames % 8
}

/// Stretcher configuration.
///
/// `None` for the sequence or seek window selects the tempo-dependent automatic length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchSettings {
    /// Analysis window length (ms)
    pub sequence_ms: Option<f64>,
    /// Range searched for the best splice offset (ms)
    pub seek_window_ms: Option<f64>,
    /// Cross-fade length (ms)
    pub overlap_ms: f64,
    /// Offset search algorithm
    pub seek: SeekStrategy,
}

impl Default for StretchSettings {
    fn default() -> Self {
        Self {
            sequence_ms: None,
            seek_window_ms: None,
            overlap_ms: DEFAULT_OVERLAP_MS,
            seek: SeekStrategy::default(),
        }
    }
}

impl StretchSettings {
    pub fn sequence_ms(mut self, ms: f64) -> Self {
        self.sequence_ms = Some(ms);
        self
    }

    pub fn seek_window_ms(mut self, ms: f64) -> Self {
        self.seek_window_ms = Some(ms);
        self
    }

    pub fn overlap_ms(mut self, ms: f64) -> Self {
        self.overlap_ms = ms;
        self
    }

    pub fn seek(mut self, seek: SeekStrategy) -> Self {
        self.seek = seek;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |ms: f64| ms.is_finite() && ms > 0.0;

        if !positive(self.overlap_ms) {
            return Err(Error::InvalidSettings(format!(
                "overlap_ms must be positive, got {}",
                self.overlap_ms
            )));
        }
        if let Some(ms) = self.sequence_ms {
            if !positive(ms) {
                return Err(Error::InvalidSettings(format!(
                    "sequence_ms must be positive, got {}",
                    ms
                )));
            }
            if ms < 2.0 * self.overlap_ms {
                return Err(Error::InvalidSettings(format!(
                    "sequence_ms ({}) must be at least twice overlap_ms ({})",
                    ms, self.overlap_ms
                )));
            }
        }
        if let Some(ms) = self.seek_window_ms {
            if !positive(ms) {
                return Err(Error::InvalidSettings(format!(
                    "seek_window_ms must be positive, got {}",
                    ms
                )));
            }
        }
        Ok(())
    }
}

/// Frame counts derived from settings, tempo and sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchGeometry {
    pub tempo: f64,
    pub sequence_ms: f64,
    pub seek_window_ms: f64,
    /// Cross-fade length
    pub overlap_length: usize,
    /// Analysis window length
    pub seek_window_length: usize,
    /// Number of candidate splice offsets
    pub seek_length: usize,
    /// Ideal input advance per iteration
    pub nominal_skip: f64,
    /// Input needed before an iteration may run
    pub sample_req: usize,
}

impl StretchGeometry {
    pub fn compute(sample_rate: f64, tempo: f64, settings: &StretchSettings) -> Self {
        let sequence_ms = settings
            .sequence_ms
            .unwrap_or_else(|| auto_sequence_ms(tempo));
        let seek_window_ms = settings
            .seek_window_ms
            .unwrap_or_else(|| auto_seek_window_ms(tempo));

        let overlap_length = overlap_frames(sample_rate, settings.overlap_ms);
        // Keep the skip positive even at tiny sample rates
        let seek_window_length =
            ((sample_rate * sequence_ms / 1000.0) as usize).max(2 * overlap_length);
        let seek_length = ((sample_rate * seek_window_ms / 1000.0) as usize).max(1);

        let nominal_skip = tempo * (seek_window_length - overlap_length) as f64;
        let int_skip = nominal_skip.round() as usize;
        let sample_req = (int_skip + overlap_length).max(seek_window_length) + seek_length;

        Self {
            tempo,
            sequence_ms,
            seek_window_ms,
            overlap_length,
            seek_window_length,
            seek_length,
            nominal_skip,
            sample_req,
        }
    }

    /// Frames copied unchanged between two cross-fades.
    #[inline]
    pub fn middle_frames(&self) -> usize {
        self.seek_window_length
            .saturating_sub(2 * self.overlap_length)
    }

    /// Frames emitted per iteration.
    #[inline]
    pub fn output_chunk_frames(&self) -> usize {
        self.overlap_length + self.middle_frames()
    }
}
