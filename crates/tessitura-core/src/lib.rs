//! Core primitives for the Tessitura pitch engine.
//!
//! # Primary API
//!
//! - [`SampleFifo`]: elastic queue of interleaved frames shared by every pipeline stage
//! - [`AtomicFloat`] / [`AtomicFlag`]: lock-free parameter cells for control threads
//! - [`ParameterRange`]: clamping and normalized mapping for host-facing parameters
//!
//! # Example
//!
//! ```
//! use tessitura_core::SampleFifo;
//!
//! let mut fifo = SampleFifo::new(2);
//! fifo.put_samples(&[0.1, -0.1, 0.2, -0.2], 0, 2);
//! assert_eq!(fifo.frames(), 2);
//!
//! let mut out = [0.0f32; 2];
//! fifo.receive_samples(&mut out, 1);
//! assert_eq!(out, [0.1, -0.1]);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod fifo;
pub use fifo::SampleFifo;

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat};

pub mod parameter;
pub use parameter::{ParameterRange, ParameterScale};

/// Channel count used by the real-time adapter.
pub const STEREO: usize = 2;
