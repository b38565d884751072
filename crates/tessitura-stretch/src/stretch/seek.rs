//! Splice offset search.
//!
//! Scores each candidate input offset by the cross-correlation between the input window
//! at that offset and the weighted overlap tail of the previous segment. Windows are
//! interleaved; channels are only ever multiplied with themselves.

use serde::{Deserialize, Serialize};

/// How candidate offsets are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeekStrategy {
    /// Every offset in `[0, seek_length)`.
    Exhaustive,
    /// Four coarse-to-fine passes over fixed offset tables.
    #[default]
    Hierarchical,
}

/// Offset deltas per refinement pass, relative to the best offset of the previous pass.
const SCAN_OFFSETS: [&[i32]; 4] = [
    &[
        124, 186, 248, 310, 372, 434, 496, 558, 620, 682, 744, 806, 868, 930, 992, 1054, 1116,
        1178, 1240, 1302, 1364, 1426, 1488,
    ],
    &[-100, -75, -50, -25, 25, 50, 75, 100],
    &[-20, -15, -10, -5, 5, 10, 15, 20],
    &[-4, -3, -2, -1, 1, 2, 3, 4],
];

/// Scale the overlap tail by a triangular window `i * (overlap - i)`.
pub fn weight_reference(mid: &[f32], reference: &mut [f32], channels: usize) {
    let overlap = mid.len() / channels;
    for (i, (src, dst)) in mid
        .chunks_exact(channels)
        .zip(reference.chunks_exact_mut(channels))
        .enumerate()
    {
        let weight = (i * (overlap - i)) as f32;
        for (s, d) in src.iter().zip(dst) {
            *d = s * weight;
        }
    }
}

/// Unnormalized cross-correlation of two interleaved windows.
///
/// Accumulation starts at the second frame.
#[inline]
pub fn cross_correlation(window: &[f32], reference: &[f32], channels: usize) -> f64 {
    let len = window.len().min(reference.len());
    if len <= channels {
        return 0.0;
    }
    window[channels..len]
        .iter()
        .zip(&reference[channels..len])
        .map(|(&a, &b)| a as f64 * b as f64)
        .sum()
}

/// Offset in `[0, seek_length)` whose window best matches `reference`.
///
/// `input` must hold at least `seek_length + overlap` frames.
pub fn best_offset(
    strategy: SeekStrategy,
    input: &[f32],
    reference: &[f32],
    channels: usize,
    seek_length: usize,
) -> usize {
    let window_len = reference.len();
    let correlate = |offset: usize| {
        let start = offset * channels;
        cross_correlation(&input[start..start + window_len], reference, channels)
    };

    match strategy {
        SeekStrategy::Exhaustive => {
            let mut best = 0;
            let mut best_corr = f64::NEG_INFINITY;
            for offset in 0..seek_length {
                let corr = correlate(offset);
                if corr > best_corr {
                    best_corr = corr;
                    best = offset;
                }
            }
            best
        }
        SeekStrategy::Hierarchical => {
            let mut base = 0i64;
            let mut best = 0i64;
            let mut best_corr = f64::NEG_INFINITY;
            for table in SCAN_OFFSETS {
                for &delta in table {
                    let candidate = base + delta as i64;
                    if candidate >= seek_length as i64 {
                        break;
                    }
                    if candidate < 0 {
                        continue;
                    }
                    let corr = correlate(candidate as usize);
                    if corr > best_corr {
                        best_corr = corr;
                        best = candidate;
                    }
                }
                base = best;
            }
            best as usize
        }
    }
}
