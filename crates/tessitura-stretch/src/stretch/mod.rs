//! WSOLA time stretcher.
//!
//! Changes duration without touching pitch. Each iteration picks the input offset whose
//! waveform best continues the previous segment, cross-fades into it over the overlap
//! window, copies the rest of the analysis window unchanged and then skips ahead by
//! `tempo` times the emitted length.
//!
//! ```text
//!   input:  |--skip--|--skip--|--skip--|
//!   output: |==seg==|==seg==|==seg==|      seg = seek_window - overlap
//! ```
//!
//! ## RT-Safety
//!
//! `process()` reuses the overlap and reference buffers; they are resized only when the
//! overlap length changes through [`Stretcher::set_parameters`].

mod geometry;
mod seek;

pub use geometry::{
    auto_seek_window_ms, auto_sequence_ms, overlap_frames, StretchGeometry, StretchSettings,
    DEFAULT_OVERLAP_MS, MIN_OVERLAP_FRAMES,
};
pub use seek::{best_offset, cross_correlation, weight_reference, SeekStrategy};

use tessitura_core::SampleFifo;

use crate::PARAM_EPSILON;

/// Stateful overlap-add duration changer between two FIFOs.
#[derive(Debug, Clone)]
pub struct Stretcher {
    channels: usize,
    sample_rate: f64,
    settings: StretchSettings,
    geometry: StretchGeometry,
    /// Tail of the previous analysis window.
    mid: Vec<f32>,
    /// `mid` under the triangular weight, rebuilt each iteration.
    reference: Vec<f32>,
    primed: bool,
    /// Rounding remainder of the input skip.
    skip_fract: f64,
}

impl Stretcher {
    pub fn new(channels: usize, sample_rate: f64) -> Self {
        Self::with_settings(channels, sample_rate, StretchSettings::default())
    }

    pub fn with_settings(channels: usize, sample_rate: f64, settings: StretchSettings) -> Self {
        let channels = channels.max(1);
        let geometry = StretchGeometry::compute(sample_rate, 1.0, &settings);
        let len = geometry.overlap_length * channels;
        Self {
            channels,
            sample_rate,
            settings,
            geometry,
            mid: vec![0.0; len],
            reference: vec![0.0; len],
            primed: false,
            skip_fract: 0.0,
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn settings(&self) -> &StretchSettings {
        &self.settings
    }

    #[inline]
    pub fn geometry(&self) -> &StretchGeometry {
        &self.geometry
    }

    #[inline]
    pub fn tempo(&self) -> f64 {
        self.geometry.tempo
    }

    /// Whether the first overlap tail has been captured.
    #[inline]
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Buffered input needed before an iteration runs.
    #[inline]
    pub fn input_chunk_frames(&self) -> usize {
        self.geometry.sample_req
    }

    /// Frames emitted by one iteration.
    #[inline]
    pub fn output_chunk_frames(&self) -> usize {
        self.geometry.output_chunk_frames()
    }

    /// Input frames held back before the first output: the priming tail plus one
    /// iteration's requirement.
    #[inline]
    pub fn latency_frames(&self) -> usize {
        self.geometry.overlap_length + self.geometry.sample_req
    }

    /// Set the duration factor (> 1.0 is faster and shorter).
    ///
    /// Window sizes are recomputed only when the tempo actually moves. Safe to call from
    /// the audio thread: no allocation, no logging.
    pub fn set_tempo(&mut self, tempo: f64) -> StretchGeometry {
        debug_assert!(tempo.is_finite() && tempo > 0.0, "tempo must be positive");
        if (tempo - self.geometry.tempo).abs() > PARAM_EPSILON {
            self.geometry = StretchGeometry::compute(self.sample_rate, tempo, &self.settings);
            self.skip_fract = 0.0;
        }
        self.geometry
    }

    /// Replace sample rate and window settings, keeping the tempo.
    ///
    /// A changed overlap length discards the captured tail.
    pub fn set_parameters(&mut self, sample_rate: f64, settings: StretchSettings) -> StretchGeometry {
        let previous_overlap = self.geometry.overlap_length;
        self.sample_rate = sample_rate;
        self.settings = settings;
        self.geometry = StretchGeometry::compute(sample_rate, self.geometry.tempo, &settings);

        if self.geometry.overlap_length != previous_overlap {
            let len = self.geometry.overlap_length * self.channels;
            self.mid.resize(len, 0.0);
            self.reference.resize(len, 0.0);
            self.clear();
        }
        tracing::debug!(
            sample_rate,
            overlap = self.geometry.overlap_length,
            seek_window = self.geometry.seek_window_length,
            seek = self.geometry.seek_length,
            "stretch parameters set"
        );
        self.geometry
    }

    /// Return to the unprimed state.
    pub fn clear(&mut self) {
        self.primed = false;
        self.skip_fract = 0.0;
        self.mid.fill(0.0);
    }

    /// Run as many iterations as the buffered input allows.
    ///
    /// Returns the number of frames appended to `output`.
    pub fn process(&mut self, input: &mut SampleFifo, output: &mut SampleFifo) -> usize {
        debug_assert_eq!(input.channels(), self.channels);
        debug_assert_eq!(output.channels(), self.channels);

        let geometry = self.geometry;
        let overlap = geometry.overlap_length;

        if !self.primed {
            if input.frames() < overlap {
                return 0;
            }
            input.extract(&mut self.mid, 0, overlap);
            input.receive(overlap);
            self.primed = true;
        }

        let middle = geometry.middle_frames();
        let mut produced = 0;

        while input.frames() >= geometry.sample_req {
            weight_reference(&self.mid, &mut self.reference, self.channels);
            let offset = best_offset(
                self.settings.seek,
                input.as_slice(),
                &self.reference,
                self.channels,
                geometry.seek_length,
            );

            Self::overlap_add(
                output.tail_mut(overlap),
                &self.mid,
                input.frame_slice(offset, overlap),
                self.channels,
            );
            output.commit(overlap);

            if middle > 0 {
                output.put_from(input, offset + overlap, middle);
            }

            input.extract(
                &mut self.mid,
                offset + geometry.seek_window_length - overlap,
                overlap,
            );

            let advance = geometry.nominal_skip + self.skip_fract;
            let skip = advance.round();
            self.skip_fract = advance - skip;
            input.receive(skip as usize);

            produced += overlap + middle;
        }

        produced
    }

    /// Fade `mid` out while fading `incoming` in.
    fn overlap_add(dest: &mut [f32], mid: &[f32], incoming: &[f32], channels: usize) {
        let overlap = mid.len() / channels;
        let scale = 1.0 / overlap as f32;
        for (i, ((out, old), new)) in dest
            .chunks_exact_mut(channels)
            .zip(mid.chunks_exact(channels))
            .zip(incoming.chunks_exact(channels))
            .enumerate()
        {
            let fade_in = i as f32 * scale;
            let fade_out = (overlap - i) as f32 * scale;
            for c in 0..channels {
                out[c] = new[c] * fade_in + old[c] * fade_out;
            }
        }
    }
}
