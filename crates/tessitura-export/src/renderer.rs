//! Offline renderer
//!
//! Drives a [`PitchShiftNode`] over whole buffers in fixed render quanta, exactly as a
//! real-time host would, but keeps only the processed frames: the priming shortfall at
//! the start is dropped and the buffered tail is flushed at the end.

use tessitura_stretch::{BlockParams, PitchShiftNode, PitchShifter};

use crate::error::{ExportError, Result};
use crate::options::RenderOptions;

/// Progress callback for render operations (0.0 to 1.0)
pub type RenderProgressCallback = Box<dyn Fn(f32) + Send>;

/// Result of a render operation
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// Left channel audio data
    pub left: Vec<f32>,
    /// Right channel audio data
    pub right: Vec<f32>,
    /// Sample rate of the rendered audio
    pub sample_rate: u32,
    /// Peak level (linear)
    pub peak_level: f32,
}

impl RenderResult {
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Get interleaved stereo data [L, R, L, R, ...]
    pub fn interleaved(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(&l, &r)| [l, r])
            .collect()
    }
}

/// Offline pitch/tempo renderer
pub struct OfflineRenderer {
    sample_rate: u32,
    options: RenderOptions,
    node: PitchShiftNode,
    progress: Option<RenderProgressCallback>,
}

impl std::fmt::Debug for OfflineRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineRenderer")
            .field("sample_rate", &self.sample_rate)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl OfflineRenderer {
    pub fn new(sample_rate: u32, options: RenderOptions) -> Result<Self> {
        options.validate()?;
        if sample_rate == 0 {
            return Err(ExportError::InvalidOptions(
                "sample rate must be positive".into(),
            ));
        }

        let shifter = PitchShifter::builder()
            .sample_rate(sample_rate as f64)
            .settings(options.settings)
            .params(options.params)
            .build()?;

        Ok(Self {
            sample_rate,
            options,
            node: PitchShiftNode::with_shifter(shifter)?,
            progress: None,
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Set the progress callback, called once per render quantum and at the end
    pub fn set_progress_callback(&mut self, callback: RenderProgressCallback) {
        self.progress = Some(callback);
    }

    /// Render a stereo buffer
    ///
    /// Both channels must have the same length. The renderer is reset first, so
    /// consecutive calls are independent.
    pub fn render(&mut self, left: &[f32], right: &[f32]) -> Result<RenderResult> {
        if left.len() != right.len() {
            return Err(ExportError::InvalidData(format!(
                "channel lengths differ: {} vs {}",
                left.len(),
                right.len()
            )));
        }

        self.node.reset();
        let block = self.options.block_frames;
        let params = self.block_params();
        let total = left.len();
        let capacity = self.options.expected_frames(total) + block;

        let mut out_left = Vec::with_capacity(capacity);
        let mut out_right = Vec::with_capacity(capacity);
        let mut block_left = vec![0.0f32; block];
        let mut block_right = vec![0.0f32; block];

        for (index, (in_l, in_r)) in left.chunks(block).zip(right.chunks(block)).enumerate() {
            let input: [&[f32]; 2] = [in_l, in_r];
            let mut output: [&mut [f32]; 2] = [&mut block_left, &mut block_right];
            self.node.process(Some(&input), &mut output, &params);

            let produced = self.node.last_output_frames();
            out_left.extend_from_slice(&block_left[..produced]);
            out_right.extend_from_slice(&block_right[..produced]);

            if let Some(ref callback) = self.progress {
                callback(((index + 1) * block).min(total) as f32 / total as f32);
            }
        }

        if self.options.flush {
            self.drain_tail(&mut out_left, &mut out_right);
        }

        if let Some(ref callback) = self.progress {
            callback(1.0);
        }

        let peak_level = out_left
            .iter()
            .chain(&out_right)
            .map(|s| s.abs())
            .fold(0.0f32, f32::max);

        tracing::info!(
            input_frames = total,
            output_frames = out_left.len(),
            peak_level,
            "offline render finished"
        );

        Ok(RenderResult {
            left: out_left,
            right: out_right,
            sample_rate: self.sample_rate,
            peak_level,
        })
    }

    fn block_params(&self) -> BlockParams {
        let params = &self.options.params;
        BlockParams {
            rate: params.rate as f32,
            tempo: params.tempo as f32,
            pitch: params.pitch as f32,
            pitch_semitones: 0.0,
        }
    }

    /// Flush the shifter and append everything it still holds.
    fn drain_tail(&mut self, left: &mut Vec<f32>, right: &mut Vec<f32>) {
        let shifter = self.node.shifter_mut();
        shifter.flush();

        let frames = shifter.available_frames();
        let mut interleaved = vec![0.0f32; frames * 2];
        let received = shifter.receive_samples(&mut interleaved, frames);
        for frame in interleaved[..received * 2].chunks_exact(2) {
            left.push(if frame[0].is_finite() { frame[0] } else { 0.0 });
            right.push(if frame[1].is_finite() { frame[1] } else { 0.0 });
        }
        tracing::debug!(frames = received, "flushed render tail");
    }
}
