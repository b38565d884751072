//! Error types for tessitura-export

use std::io;
use thiserror::Error;

/// Export error type
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Pitch shifter could not be configured
    #[error(transparent)]
    Stretch(#[from] tessitura_stretch::Error),

    /// Invalid render options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Invalid audio data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

// hound reports both I/O and format problems through one type
impl From<hound::Error> for ExportError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => ExportError::Io(io),
            other => ExportError::InvalidData(other.to_string()),
        }
    }
}
