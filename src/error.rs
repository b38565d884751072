//! Centralized error type for the tessitura umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tessitura_core::Error),

    #[error("Stretch: {0}")]
    Stretch(#[from] tessitura_stretch::Error),

    #[cfg(feature = "export")]
    #[error("Export: {0}")]
    Export(#[from] tessitura_export::ExportError),
}

pub type Result<T> = std::result::Result<T, Error>;
