//! Render options.

use serde::{Deserialize, Serialize};
use tessitura_stretch::{PitchParams, StretchSettings};

use crate::error::{ExportError, Result};

/// Sample format of written WAV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitDepth {
    Int16,
    Int24,
    #[default]
    Float32,
}

impl BitDepth {
    /// Bits per sample.
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }
}

/// Offline render options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Frames per render quantum.
    pub block_frames: usize,
    /// Pitch, tempo and rate for the whole render.
    pub params: PitchParams,
    /// Stretch window settings.
    pub settings: StretchSettings,
    /// Push the buffered tail out after the last block.
    pub flush: bool,
    /// Sample format of written files.
    pub bit_depth: BitDepth,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            block_frames: 128,
            params: PitchParams::default(),
            settings: StretchSettings::default(),
            flush: true,
            bit_depth: BitDepth::Float32,
        }
    }
}

impl RenderOptions {
    pub fn block_frames(mut self, frames: usize) -> Self {
        self.block_frames = frames;
        self
    }

    pub fn params(mut self, params: PitchParams) -> Self {
        self.params = params;
        self
    }

    pub fn settings(mut self, settings: StretchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    pub fn bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// Output frames expected for `input_frames` of input.
    pub fn expected_frames(&self, input_frames: usize) -> usize {
        (input_frames as f64 / (self.params.tempo * self.params.rate)).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_frames == 0 {
            return Err(ExportError::InvalidOptions(
                "block_frames must be at least 1".into(),
            ));
        }
        self.settings.validate()?;
        self.params.validate()?;
        Ok(())
    }
}
