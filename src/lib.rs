//! # Tessitura - Real-time Pitch Shifting
//!
//! Pitch shifting and time stretching for a host that renders fixed-size blocks under a
//! hard deadline.
//!
//! ## Architecture
//!
//! Tessitura is an umbrella crate that coordinates:
//! - **tessitura-core** - Sample FIFO, lock-free parameter cells, parameter ranges
//! - **tessitura-stretch** - Rate transposer, WSOLA stretcher, pitch shifter, block adapter
//! - **tessitura-export** - Offline rendering of buffers and WAV files
//!
//! ## Quick Start
//!
//! ```
//! use tessitura::prelude::*;
//!
//! let mut node = PitchShiftNode::new(48000.0)?;
//! let controls = PitchShiftControls::new();
//! controls.set_pitch_semitones(7.0);
//!
//! let left = vec![0.0f32; 128];
//! let right = vec![0.0f32; 128];
//! let mut out_l = vec![0.0f32; 128];
//! let mut out_r = vec![0.0f32; 128];
//!
//! let input: [&[f32]; 2] = [&left, &right];
//! let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
//! node.process_with(&controls, Some(&input), &mut output);
//! # Ok::<(), tessitura::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Pipeline plus offline export
//! - `export` - Offline rendering and WAV I/O

pub mod error;
pub use error::{Error, Result};

/// Re-export of tessitura-core for direct access
pub use tessitura_core as core;

/// Re-export of tessitura-stretch for direct access
pub use tessitura_stretch as stretch;

// Core types
pub use tessitura_core::{AtomicFlag, AtomicFloat, ParameterRange, ParameterScale, SampleFifo};

// Pipeline
pub use tessitura_stretch::{
    BlockParams, PitchParams, PitchShiftControls, PitchShiftNode, PitchShifter,
    PitchShifterBuilder, RateTransposer, SeekStrategy, StretchSettings, Stretcher, Topology,
};

// Export subsystem
#[cfg(feature = "export")]
pub use tessitura_export as export;

#[cfg(feature = "export")]
pub use tessitura_export::{render_wav_file, OfflineRenderer, RenderOptions, RenderResult};

/// Common imports
pub mod prelude {
    pub use crate::{Error, Result};

    pub use tessitura_core::SampleFifo;
    pub use tessitura_stretch::{
        semitones_to_ratio, BlockParams, PitchParams, PitchShiftControls, PitchShiftNode,
        PitchShifter, StretchSettings,
    };

    #[cfg(feature = "export")]
    pub use tessitura_export::{render_wav_file, OfflineRenderer, RenderOptions};
}
