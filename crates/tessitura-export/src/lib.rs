//! # Tessitura Export
//!
//! Offline rendering for the Tessitura pitch engine.
//!
//! - [`OfflineRenderer`]: runs whole buffers through the real-time node in render quanta
//! - [`render_wav_file`]: WAV in, pitch/tempo-changed WAV out (via hound)
//!
//! ```no_run
//! use std::path::Path;
//! use tessitura_export::{render_wav_file, RenderOptions};
//! use tessitura_stretch::PitchParams;
//!
//! let options = RenderOptions::default().params(PitchParams::new().pitch_semitones(7.0));
//! render_wav_file(Path::new("in.wav"), Path::new("out.wav"), &options)?;
//! # Ok::<(), tessitura_export::ExportError>(())
//! ```

pub mod error;
mod options;
pub mod renderer;
pub mod wav;

pub use error::{ExportError, Result};
pub use options::{BitDepth, RenderOptions};
pub use renderer::{OfflineRenderer, RenderProgressCallback, RenderResult};
pub use wav::{read_wav, render_wav_file, write_wav, WavAudio};
