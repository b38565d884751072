//! Per-block adapter between a real-time host and the pitch shifter.
//!
//! The host calls [`PitchShiftNode::process`] once per render quantum with planar
//! channel slices. The node interleaves, runs one pipeline step and de-interleaves
//! whatever is ready; any shortfall is silence.
//!
//! ## RT-Safety
//!
//! The interleave scratch grows to the largest block seen and is reused afterwards. With
//! steady block sizes `process()` does not allocate once the pipeline FIFOs are warm.
//! Nothing on the per-block path logs; rejected parameters are dropped silently.

use tessitura_core::{Error as CoreError, STEREO};

use crate::controls::PitchShiftControls;
use crate::error::Result;
use crate::params::{semitones_to_ratio, PitchParams};
use crate::pipeline::PitchShifter;

/// Parameter values delivered with one block, already clamped by the sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockParams {
    pub rate: f32,
    pub tempo: f32,
    /// Pitch as a frequency ratio
    pub pitch: f32,
    /// Pitch offset applied on top of `pitch`
    pub pitch_semitones: f32,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            tempo: 1.0,
            pitch: 1.0,
            pitch_semitones: 0.0,
        }
    }
}

impl BlockParams {
    /// Ratio and semitone offset merged into one frequency ratio.
    #[inline]
    pub fn effective_pitch(&self) -> f64 {
        self.pitch as f64 * semitones_to_ratio(self.pitch_semitones as f64)
    }

    #[inline]
    pub fn to_pitch_params(&self) -> PitchParams {
        PitchParams {
            rate: self.rate as f64,
            tempo: self.tempo as f64,
            pitch: self.effective_pitch(),
        }
    }
}

#[inline]
fn finite_or_zero(sample: f32) -> f32 {
    if sample.is_finite() {
        sample
    } else {
        0.0
    }
}

/// Stereo pitch shifting node.
#[derive(Debug, Clone)]
pub struct PitchShiftNode {
    shifter: PitchShifter,
    /// Parameters last pushed into the shifter.
    last: Option<BlockParams>,
    /// Interleaved frames, in and out.
    scratch: Vec<f32>,
    /// Processed frames written at the start of the last block.
    last_output_frames: usize,
}

impl PitchShiftNode {
    /// Stereo node with default stretch settings.
    pub fn new(sample_rate: f64) -> Result<Self> {
        Self::with_shifter(PitchShifter::new(STEREO, sample_rate)?)
    }

    /// Wrap a configured shifter. It must be stereo.
    pub fn with_shifter(shifter: PitchShifter) -> Result<Self> {
        if shifter.channels() != STEREO {
            return Err(CoreError::ChannelMismatch {
                expected: STEREO,
                got: shifter.channels(),
            }
            .into());
        }
        Ok(Self {
            shifter,
            last: None,
            scratch: Vec::new(),
            last_output_frames: 0,
        })
    }

    #[inline]
    pub fn shifter(&self) -> &PitchShifter {
        &self.shifter
    }

    #[inline]
    pub fn shifter_mut(&mut self) -> &mut PitchShifter {
        &mut self.shifter
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.shifter.sample_rate()
    }

    /// Input frames before the first processed frame.
    #[inline]
    pub fn latency_frames(&self) -> usize {
        self.shifter.initial_latency_frames()
    }

    /// Processed frames at the start of the last output block; the rest was shortfall
    /// silence.
    #[inline]
    pub fn last_output_frames(&self) -> usize {
        self.last_output_frames
    }

    /// Drop buffered audio. The next block's parameters are pushed again.
    pub fn reset(&mut self) {
        self.shifter.clear();
        self.last = None;
    }

    /// Process one render quantum.
    ///
    /// `input` is `None` (or holds no samples) when upstream has nothing to deliver; the
    /// output is then silent and the pipeline is not touched. Mono input is used for both
    /// channels. Output channels past the second are silenced.
    ///
    /// Always returns `true`: the node stays alive.
    pub fn process(
        &mut self,
        input: Option<&[&[f32]]>,
        output: &mut [&mut [f32]],
        params: &BlockParams,
    ) -> bool {
        let Some(input) = input.filter(|channels| has_samples(channels)) else {
            for channel in output.iter_mut() {
                channel.fill(0.0);
            }
            self.last_output_frames = 0;
            return true;
        };

        self.apply(params);

        let in_frames = input.iter().map(|c| c.len()).min().unwrap_or(0);
        let out_frames = output.iter().map(|c| c.len()).max().unwrap_or(0);
        let needed = in_frames.max(out_frames) * STEREO;
        if self.scratch.len() < needed {
            self.scratch.resize(needed, 0.0);
        }

        let left = input[0];
        let right = input.get(1).copied().unwrap_or(left);
        for (i, frame) in self.scratch[..in_frames * STEREO]
            .chunks_exact_mut(STEREO)
            .enumerate()
        {
            frame[0] = finite_or_zero(left[i]);
            frame[1] = finite_or_zero(right[i]);
        }
        self.shifter.put_samples(&self.scratch, in_frames);

        self.shifter.process();

        let drained = &mut self.scratch[..out_frames * STEREO];
        drained.fill(0.0);
        self.last_output_frames = self.shifter.receive_samples(drained, out_frames);

        for (c, channel) in output.iter_mut().enumerate() {
            if c >= STEREO {
                channel.fill(0.0);
                continue;
            }
            for (out, frame) in channel.iter_mut().zip(drained.chunks_exact(STEREO)) {
                *out = finite_or_zero(frame[c]);
            }
        }
        true
    }

    /// Process one block with parameters sampled from a shared channel.
    ///
    /// A pending reset request is honoured only on a block that carries input.
    pub fn process_with(
        &mut self,
        controls: &PitchShiftControls,
        input: Option<&[&[f32]]>,
        output: &mut [&mut [f32]],
    ) -> bool {
        if input.is_some_and(has_samples) && controls.take_reset() {
            self.reset();
        }
        self.process(input, output, &controls.snapshot())
    }

    /// Push parameters into the shifter if they changed since the last block.
    fn apply(&mut self, params: &BlockParams) {
        if self.last.as_ref() == Some(params) {
            return;
        }
        if self.shifter.apply_params(params.to_pitch_params()) {
            self.last = Some(*params);
        }
    }
}

fn has_samples(channels: &[&[f32]]) -> bool {
    channels.first().is_some_and(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const SR: f64 = 48000.0;
    const QUANTUM: usize = 128;

    fn sine(frames: usize, freq: f32, offset: usize) -> Vec<f32> {
        (offset..offset + frames)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / SR as f32).sin() * 0.5)
            .collect()
    }

    fn block(node: &mut PitchShiftNode, left: &[f32], right: &[f32], params: &BlockParams) -> (Vec<f32>, Vec<f32>) {
        let mut out_l = vec![0.0; left.len()];
        let mut out_r = vec![0.0; right.len()];
        let input: [&[f32]; 2] = [left, right];
        let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
        assert!(node.process(Some(&input), &mut output, params));
        (out_l, out_r)
    }

    #[test]
    fn test_effective_pitch_merges_semitones() {
        let params = BlockParams {
            pitch: 1.5,
            pitch_semitones: 12.0,
            ..BlockParams::default()
        };
        assert!((params.effective_pitch() - 3.0).abs() < 1e-9);
        assert!((params.to_pitch_params().pitch - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_stereo_shifter() {
        let shifter = PitchShifter::new(1, SR).unwrap();
        assert_eq!(
            PitchShiftNode::with_shifter(shifter).unwrap_err(),
            Error::Core(CoreError::ChannelMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    /// Longest run of exact zeros after the first non-zero sample.
    fn longest_silent_run(samples: &[f32]) -> usize {
        let start = samples.iter().position(|&s| s != 0.0).unwrap_or(samples.len());
        let mut longest = 0;
        let mut run = 0;
        for &s in &samples[start..] {
            run = if s == 0.0 { run + 1 } else { 0 };
            longest = longest.max(run);
        }
        longest
    }

    #[test]
    fn test_neutral_blocks_run_both_stages() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let latency = node.latency_frames();
        let mut out = Vec::new();
        for n in 0..200 {
            let left = sine(QUANTUM, 440.0, n * QUANTUM);
            let right = sine(QUANTUM, 660.0, n * QUANTUM);
            let (out_l, out_r) = block(&mut node, &left, &right, &BlockParams::default());
            assert!(out_r.iter().all(|s| s.is_finite()));
            out.extend_from_slice(&out_l);
        }

        // Delayed by the stretch window, then the same level as the input
        let first = out.iter().position(|&s| s != 0.0).unwrap();
        assert!(first <= latency + QUANTUM, "first output at {}", first);
        let settled = &out[first + 4 * QUANTUM..];
        assert!((rms(settled) - 0.5 / 2f32.sqrt()).abs() < 0.05 * 0.354);
        assert!(longest_silent_run(&out) <= QUANTUM);
    }

    #[test]
    fn test_leaving_neutral_does_not_drop_out() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let neutral = BlockParams::default();
        let shifted = BlockParams {
            pitch: 1.01,
            ..BlockParams::default()
        };

        let mut out = Vec::new();
        for n in 0..600 {
            let params = if n < 300 { &neutral } else { &shifted };
            let left = sine(QUANTUM, 440.0, n * QUANTUM);
            let (out_l, _) = block(&mut node, &left, &left, params);
            out.extend_from_slice(&out_l);
        }
        let longest = longest_silent_run(&out);
        assert!(longest <= QUANTUM, "silent run of {} frames", longest);
    }

    #[test]
    fn test_unusable_params_are_skipped() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let left = sine(QUANTUM, 440.0, 0);
        let good = BlockParams {
            pitch: 1.5,
            ..BlockParams::default()
        };
        block(&mut node, &left, &left, &good);

        let bad = BlockParams {
            tempo: f32::NAN,
            ..BlockParams::default()
        };
        block(&mut node, &left, &left, &bad);
        assert!((node.shifter().params().pitch - 1.5).abs() < 1e-6);
        assert_eq!(node.shifter().params().tempo, 1.0);
    }

    #[test]
    fn test_no_input_is_silent_and_untouched() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let shifting = BlockParams {
            pitch: 2.0,
            ..BlockParams::default()
        };
        for n in 0..100 {
            let left = sine(QUANTUM, 440.0, n * QUANTUM);
            block(&mut node, &left, &left, &shifting);
        }
        let unprocessed = node.shifter().unprocessed_frames();
        let available = node.shifter().available_frames();

        let mut out_l = vec![1.0f32; QUANTUM];
        let mut out_r = vec![1.0f32; QUANTUM];
        let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
        let other = BlockParams {
            pitch: 0.5,
            ..BlockParams::default()
        };
        assert!(node.process(None, &mut output, &other));

        assert!(out_l.iter().chain(&out_r).all(|&s| s == 0.0));
        assert_eq!(node.shifter().unprocessed_frames(), unprocessed);
        assert_eq!(node.shifter().available_frames(), available);
        assert_eq!(node.shifter().params().pitch, 2.0);
    }

    #[test]
    fn test_empty_channels_count_as_no_input() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let mut out = vec![0.5f32; QUANTUM];
        let input: [&[f32]; 0] = [];
        let mut output: [&mut [f32]; 1] = [&mut out];
        assert!(node.process(Some(&input), &mut output, &BlockParams::default()));
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_non_finite_input_never_escapes() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let params = BlockParams {
            pitch: 1.5,
            ..BlockParams::default()
        };
        for n in 0..400 {
            let mut left = sine(QUANTUM, 440.0, n * QUANTUM);
            if n % 7 == 3 {
                left[5] = f32::NAN;
                left[9] = f32::INFINITY;
            }
            let (out_l, out_r) = block(&mut node, &left, &left.clone(), &params);
            assert!(out_l.iter().chain(&out_r).all(|s| s.is_finite()));
        }
    }

    #[test]
    fn test_mono_input_feeds_both_channels() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let mut heard = false;
        for n in 0..100 {
            let mono = sine(QUANTUM, 440.0, n * QUANTUM);
            let mut out_l = vec![0.0f32; QUANTUM];
            let mut out_r = vec![0.0f32; QUANTUM];
            let input: [&[f32]; 1] = [&mono];
            let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
            node.process(Some(&input), &mut output, &BlockParams::default());
            assert_eq!(out_l, out_r);
            heard |= out_l.iter().any(|&s| s != 0.0);
        }
        assert!(heard);
    }

    #[test]
    fn test_shortfall_is_silence() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let params = BlockParams {
            pitch: 2.0,
            ..BlockParams::default()
        };
        // Still priming: nothing to drain yet
        let left = sine(QUANTUM, 440.0, 0);
        let (out_l, out_r) = block(&mut node, &left, &left, &params);
        assert!(out_l.iter().chain(&out_r).all(|&s| s == 0.0));
        assert_eq!(node.last_output_frames(), 0);
    }

    #[test]
    fn test_extra_output_channels_are_silenced() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let left = sine(QUANTUM, 440.0, 0);
        let mut outs = [vec![0.0f32; QUANTUM], vec![0.0f32; QUANTUM], vec![0.7f32; QUANTUM]];
        let input: [&[f32]; 2] = [&left, &left];
        let [a, b, c] = &mut outs;
        let mut output: [&mut [f32]; 3] = [a, b, c];
        node.process(Some(&input), &mut output, &BlockParams::default());
        assert!(outs[0].iter().all(|s| s.is_finite()));
        assert!(outs[2].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_reset_via_controls() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        let controls = PitchShiftControls::new();
        controls.set_pitch(1.5);

        let left = sine(QUANTUM * 40, 440.0, 0);
        let mut out_l = vec![0.0f32; QUANTUM * 40];
        let mut out_r = vec![0.0f32; QUANTUM * 40];
        {
            let input: [&[f32]; 2] = [&left, &left];
            let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
            node.process_with(&controls, Some(&input), &mut output);
        }
        assert!(node.shifter().unprocessed_frames() > 0);

        controls.request_reset();
        {
            // Silent blocks leave the request pending
            let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
            node.process_with(&controls, None, &mut output);
        }
        assert!(node.shifter().unprocessed_frames() > 0);

        let short = sine(QUANTUM, 440.0, 0);
        let input: [&[f32]; 2] = [&short, &short];
        let mut out_l = vec![0.0f32; QUANTUM];
        let mut out_r = vec![0.0f32; QUANTUM];
        let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
        node.process_with(&controls, Some(&input), &mut output);
        assert!(!controls.take_reset());
        assert!(node.shifter().unprocessed_frames() <= QUANTUM);
    }

    #[test]
    fn test_latency_reported() {
        let mut node = PitchShiftNode::new(SR).unwrap();
        assert_eq!(node.latency_frames(), node.shifter().initial_latency_frames());
        node.shifter_mut().set_pitch(2.0);
        assert_eq!(node.latency_frames(), 6912 + 384);
    }
}
