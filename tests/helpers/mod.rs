//! Test helpers and fixtures for Tessitura integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (copies, silence)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)
//! - `FREQUENCY_TOLERANCE` (5%): Pitch estimates from zero crossings

#![allow(dead_code)]

pub mod tolerances;

use tessitura::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Render quantum used by block-based hosts.
pub const TEST_QUANTUM: usize = 128;

/// Install a tracing subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Create a node at the test sample rate.
pub fn test_node() -> PitchShiftNode {
    PitchShiftNode::new(TEST_SAMPLE_RATE).expect("Failed to create test node")
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Interleave two equal-length channels.
pub fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
    left.iter()
        .zip(right)
        .flat_map(|(&l, &r)| [l, r])
        .collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Longest run of exact zeros after the first sound.
///
/// Leading silence is pipeline latency and is not counted.
pub fn longest_silent_run(samples: &[f32]) -> usize {
    let Some(onset) = samples.iter().position(|&s| s != 0.0) else {
        return 0;
    };
    let mut longest = 0;
    let mut run = 0;
    for &s in &samples[onset..] {
        if s == 0.0 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Estimate the frequency of a tonal signal from its positive-going zero crossings.
///
/// Uses the span between the first and last crossing, so partial periods at either end
/// do not bias the estimate.
pub fn zero_crossing_frequency(samples: &[f32], sample_rate: f64) -> f64 {
    let crossings: Vec<usize> = samples
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] < 0.0 && w[1] >= 0.0)
        .map(|(i, _)| i)
        .collect();
    match (crossings.first(), crossings.last()) {
        (Some(&first), Some(&last)) if last > first => {
            (crossings.len() - 1) as f64 * sample_rate / (last - first) as f64
        }
        _ => 0.0,
    }
}

/// Feed `left`/`right` through the node one quantum at a time.
///
/// Returns the concatenated output channels, one quantum per input quantum. A trailing
/// partial quantum is zero-padded.
pub fn run_node(
    node: &mut PitchShiftNode,
    params: &BlockParams,
    left: &[f32],
    right: &[f32],
) -> (Vec<f32>, Vec<f32>) {
    let mut out_left = Vec::with_capacity(left.len());
    let mut out_right = Vec::with_capacity(right.len());
    let mut in_l = vec![0.0f32; TEST_QUANTUM];
    let mut in_r = vec![0.0f32; TEST_QUANTUM];
    let mut block_l = vec![0.0f32; TEST_QUANTUM];
    let mut block_r = vec![0.0f32; TEST_QUANTUM];

    for (l, r) in left.chunks(TEST_QUANTUM).zip(right.chunks(TEST_QUANTUM)) {
        in_l.fill(0.0);
        in_r.fill(0.0);
        in_l[..l.len()].copy_from_slice(l);
        in_r[..r.len()].copy_from_slice(r);

        let input: [&[f32]; 2] = [&in_l, &in_r];
        let mut output: [&mut [f32]; 2] = [&mut block_l, &mut block_r];
        assert!(node.process(Some(&input), &mut output, params));

        out_left.extend_from_slice(&block_l);
        out_right.extend_from_slice(&block_r);
    }
    (out_left, out_right)
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Assert every sample is finite.
pub fn assert_finite(samples: &[f32], context: &str) {
    if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
        panic!("{}: non-finite sample {} at index {}", context, samples[i], i);
    }
}
