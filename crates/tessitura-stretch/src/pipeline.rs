//! Pitch shifter: rate transposer and stretcher wired into one pipeline.
//!
//! A pitch ratio `p` is realized by resampling by `rate × p` and stretching by
//! `tempo / p`: the transposer moves the pitch and changes the duration, the stretcher
//! restores the duration. The stage that shrinks the signal runs last so that the
//! expensive stretch works on as few frames as possible.
//!
//! ```text
//!   input ──► [stage 0] ──► intermediate ──► [stage 1] ──► output
//! ```

use tessitura_core::{Error as CoreError, SampleFifo};

use crate::error::{is_valid_factor, Result};
use crate::params::{octaves_to_ratio, percent_to_factor, semitones_to_ratio, PitchParams};
use crate::pipe::{PipeKind, Topology};
use crate::stretch::{StretchSettings, Stretcher};
use crate::transposer::RateTransposer;
use crate::PARAM_EPSILON;

/// Silence pushed per round while flushing.
const FLUSH_BLOCK_FRAMES: usize = 128;

/// Upper bound on flush rounds.
const MAX_FLUSH_ROUNDS: usize = 200;

/// Builder for [`PitchShifter`].
#[derive(Debug, Clone)]
pub struct PitchShifterBuilder {
    channels: usize,
    sample_rate: f64,
    settings: StretchSettings,
    params: PitchParams,
}

impl Default for PitchShifterBuilder {
    fn default() -> Self {
        Self {
            channels: tessitura_core::STEREO,
            sample_rate: 44100.0,
            settings: StretchSettings::default(),
            params: PitchParams::default(),
        }
    }
}

impl PitchShifterBuilder {
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn settings(mut self, settings: StretchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn params(mut self, params: PitchParams) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<PitchShifter> {
        let channels = CoreError::check_channels(self.channels)?;
        let sample_rate = CoreError::check_sample_rate(self.sample_rate)?;
        self.settings.validate()?;
        self.params.validate()?;

        let mut shifter = PitchShifter {
            channels,
            sample_rate,
            params: PitchParams::default(),
            effective_rate: 1.0,
            effective_tempo: 1.0,
            topology: Topology::default(),
            transposer: RateTransposer::new(channels),
            stretcher: Stretcher::with_settings(channels, sample_rate, self.settings),
            fifos: [
                SampleFifo::new(channels),
                SampleFifo::new(channels),
                SampleFifo::new(channels),
            ],
        };
        shifter.set_params(self.params);

        tracing::debug!(
            channels,
            sample_rate,
            rate = shifter.params.rate,
            tempo = shifter.params.tempo,
            pitch = shifter.params.pitch,
            "pitch shifter created"
        );
        Ok(shifter)
    }
}

/// Pitch, tempo and rate changer over interleaved audio.
///
/// Feed frames with [`put_samples`](Self::put_samples), call [`process`](Self::process),
/// then drain with [`receive_samples`](Self::receive_samples). Output appears only once
/// the stretcher has enough buffered input, see
/// [`initial_latency_frames`](Self::initial_latency_frames).
#[derive(Debug, Clone)]
pub struct PitchShifter {
    channels: usize,
    sample_rate: f64,
    params: PitchParams,
    effective_rate: f64,
    effective_tempo: f64,
    topology: Topology,
    transposer: RateTransposer,
    stretcher: Stretcher,
    /// Indexed by the `Topology` slot constants.
    fifos: [SampleFifo; 3],
}

impl PitchShifter {
    pub fn builder() -> PitchShifterBuilder {
        PitchShifterBuilder::default()
    }

    /// Neutral shifter with default stretch settings.
    pub fn new(channels: usize, sample_rate: f64) -> Result<Self> {
        Self::builder()
            .channels(channels)
            .sample_rate(sample_rate)
            .build()
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
    pub fn params(&self) -> &PitchParams {
        &self.params
    }

    /// Resample factor currently applied by the transposer.
    #[inline]
    pub fn effective_rate(&self) -> f64 {
        self.effective_rate
    }

    /// Duration factor currently applied by the stretcher.
    #[inline]
    pub fn effective_tempo(&self) -> f64 {
        self.effective_tempo
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn stretcher(&self) -> &Stretcher {
        &self.stretcher
    }

    #[inline]
    pub fn transposer(&self) -> &RateTransposer {
        &self.transposer
    }

    pub fn set_rate(&mut self, rate: f64) {
        if self.accept("rate", rate) {
            self.params.rate = rate;
            self.update();
        }
    }

    pub fn set_tempo(&mut self, tempo: f64) {
        if self.accept("tempo", tempo) {
            self.params.tempo = tempo;
            self.update();
        }
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        if self.accept("pitch", pitch) {
            self.params.pitch = pitch;
            self.update();
        }
    }

    pub fn set_pitch_octaves(&mut self, octaves: f64) {
        self.set_pitch(octaves_to_ratio(octaves));
    }

    pub fn set_pitch_semitones(&mut self, semitones: f64) {
        self.set_pitch(semitones_to_ratio(semitones));
    }

    /// Rate as a percent change (`+100` doubles the rate).
    pub fn set_rate_change(&mut self, percent: f64) {
        self.set_rate(percent_to_factor(percent));
    }

    /// Tempo as a percent change (`-50` halves the tempo).
    pub fn set_tempo_change(&mut self, percent: f64) {
        self.set_tempo(percent_to_factor(percent));
    }

    /// Replace the whole parameter triple. Ignored if any factor is unusable.
    pub fn set_params(&mut self, params: PitchParams) {
        if let Err(e) = params.validate() {
            tracing::warn!("ignoring pitch parameters: {}", e);
            return;
        }
        self.apply_params(params);
    }

    /// Audio-thread variant of [`set_params`](Self::set_params): never logs.
    ///
    /// Returns `false` and leaves the shifter unchanged if any factor is unusable.
    pub(crate) fn apply_params(&mut self, params: PitchParams) -> bool {
        if params.validate().is_err() {
            return false;
        }
        self.params = params;
        self.update();
        true
    }

    fn accept(&self, name: &'static str, value: f64) -> bool {
        let valid = is_valid_factor(value);
        if !valid {
            tracing::warn!(name, value, "ignoring unusable factor");
        }
        valid
    }

    /// Push the parameter triple down into the stages.
    fn update(&mut self) {
        let rate = self.params.effective_rate();
        let tempo = self.params.effective_tempo();

        if (rate - self.effective_rate).abs() > PARAM_EPSILON {
            self.effective_rate = self.transposer.set_rate(rate);
        }
        if (tempo - self.effective_tempo).abs() > PARAM_EPSILON {
            self.effective_tempo = self.stretcher.set_tempo(tempo).tempo;
        }

        let topology = Topology::for_rate(self.effective_rate);
        if topology != self.topology {
            self.switch_topology(topology);
        }
    }

    /// Change stage order by re-pointing the two stage inputs.
    ///
    /// Each stage keeps its own input FIFO, so the stretcher carries its backlog and
    /// primed overlap across the switch and output continues without a gap. Frames in
    /// that backlog were prepared for the previous order: for about one window they get
    /// the resample factor twice or not at all. Nothing is copied.
    fn switch_topology(&mut self, topology: Topology) {
        self.fifos.swap(Topology::INPUT, Topology::INTERMEDIATE);
        self.topology = topology;
    }

    /// Run both stages over whatever is buffered.
    pub fn process(&mut self) {
        for (stage, kind) in self.topology.order().into_iter().enumerate() {
            let (head, tail) = self.fifos.split_at_mut(stage + 1);
            let (src, dst) = (&mut head[stage], &mut tail[0]);
            match kind {
                PipeKind::Transposer => self.transposer.process(src, dst),
                PipeKind::Stretcher => self.stretcher.process(src, dst),
            };
        }
    }

    /// Append `frames` interleaved frames to the input. Does not process.
    pub fn put_samples(&mut self, samples: &[f32], frames: usize) {
        self.fifos[Topology::INPUT].put_samples(samples, 0, frames);
    }

    /// Move up to `max_frames` processed frames into `output`. Returns the frames written.
    pub fn receive_samples(&mut self, output: &mut [f32], max_frames: usize) -> usize {
        self.fifos[Topology::OUTPUT].receive_samples(output, max_frames)
    }

    #[inline]
    pub fn input_mut(&mut self) -> &mut SampleFifo {
        &mut self.fifos[Topology::INPUT]
    }

    #[inline]
    pub fn output(&self) -> &SampleFifo {
        &self.fifos[Topology::OUTPUT]
    }

    #[inline]
    pub fn output_mut(&mut self) -> &mut SampleFifo {
        &mut self.fifos[Topology::OUTPUT]
    }

    /// Processed frames ready to be received.
    #[inline]
    pub fn available_frames(&self) -> usize {
        self.fifos[Topology::OUTPUT].frames()
    }

    /// Frames waiting in the input and intermediate FIFOs.
    #[inline]
    pub fn unprocessed_frames(&self) -> usize {
        self.fifos[Topology::INPUT].frames() + self.fifos[Topology::INTERMEDIATE].frames()
    }

    /// Input frames needed before the first output frame appears.
    pub fn initial_latency_frames(&self) -> usize {
        let stretch = self.stretcher.latency_frames() as f64;
        let latency = match self.topology {
            // Stretcher sees resampled frames
            Topology::TransposeThenStretch => stretch * self.effective_rate,
            Topology::StretchThenTranspose => stretch,
        };
        latency.round() as usize
    }

    /// Output frames still owed for everything buffered ahead of the output FIFO.
    fn pending_output_frames(&self) -> f64 {
        let input = self.fifos[Topology::INPUT].frames() as f64;
        let intermediate = self.fifos[Topology::INTERMEDIATE].frames() as f64;
        let remaining_stage = match self.topology {
            Topology::TransposeThenStretch => self.effective_tempo,
            Topology::StretchThenTranspose => self.effective_rate,
        };
        input / (self.params.tempo * self.params.rate) + intermediate / remaining_stage
    }

    /// Push every buffered frame through to the output.
    ///
    /// Silence is fed until the output holds the frames owed for the buffered input, the
    /// excess is trimmed and the stage state is cleared. Allocates; call off the audio
    /// thread or at end of stream.
    pub fn flush(&mut self) {
        let expected = self.available_frames() + self.pending_output_frames().round() as usize;
        if expected == self.available_frames() {
            return;
        }

        let silence = vec![0.0f32; FLUSH_BLOCK_FRAMES * self.channels];
        let mut rounds = 0;
        while self.available_frames() < expected && rounds < MAX_FLUSH_ROUNDS {
            self.put_samples(&silence, FLUSH_BLOCK_FRAMES);
            self.process();
            rounds += 1;
        }

        self.fifos[Topology::OUTPUT].truncate(expected);
        self.fifos[Topology::INPUT].clear();
        self.fifos[Topology::INTERMEDIATE].clear();
        self.transposer.clear();
        self.stretcher.clear();

        tracing::debug!(
            expected,
            available = self.available_frames(),
            rounds,
            "pitch shifter flushed"
        );
    }

    /// Drop all buffered audio and stage state. Parameters are kept.
    pub fn clear(&mut self) {
        for fifo in &mut self.fifos {
            fifo.clear();
        }
        self.transposer.clear();
        self.stretcher.clear();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        let sample_rate = CoreError::check_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.stretcher
            .set_parameters(sample_rate, *self.stretcher.settings());
        Ok(())
    }

    pub fn set_settings(&mut self, settings: StretchSettings) -> Result<()> {
        settings.validate()?;
        self.stretcher.set_parameters(self.sample_rate, settings);
        Ok(())
    }
}
