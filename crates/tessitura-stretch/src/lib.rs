//! Real-time pitch shifting and time stretching.
//!
//! A linear-interpolation rate transposer and a WSOLA time stretcher are chained by
//! [`PitchShifter`], which turns a (rate, tempo, pitch) triple into one resample factor
//! and one duration factor. [`PitchShiftNode`] adapts the shifter to a host that calls
//! once per fixed-size render quantum with planar channel slices.
//!
//! # Example
//!
//! ```
//! use tessitura_stretch::{BlockParams, PitchShiftNode};
//!
//! let mut node = PitchShiftNode::new(48000.0)?;
//! let params = BlockParams { pitch: 2.0, ..BlockParams::default() };
//!
//! let left = vec![0.0f32; 128];
//! let right = vec![0.0f32; 128];
//! let mut out_l = vec![0.0f32; 128];
//! let mut out_r = vec![0.0f32; 128];
//!
//! let input: [&[f32]; 2] = [&left, &right];
//! let mut output: [&mut [f32]; 2] = [&mut out_l, &mut out_r];
//! node.process(Some(&input), &mut output, &params);
//! # Ok::<(), tessitura_stretch::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod params;
pub use params::{octaves_to_ratio, percent_to_factor, semitones_to_ratio, PitchParams};

pub mod transposer;
pub use transposer::RateTransposer;

pub mod stretch;
pub use stretch::{SeekStrategy, StretchGeometry, StretchSettings, Stretcher};

pub mod pipe;
pub use pipe::{PipeKind, Topology};

mod pipeline;
pub use pipeline::{PitchShifter, PitchShifterBuilder};

mod node;
pub use node::{BlockParams, PitchShiftNode};

mod controls;
pub use controls::PitchShiftControls;

/// Parameter changes at or below this size leave derived state alone.
pub const PARAM_EPSILON: f64 = 1e-10;
